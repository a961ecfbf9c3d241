//! The product catalog: categories, product listings and their images.
use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Category, NewCategory, NewProductImage, Product, ProductImage},
    helpers::{slugify, ValidationErrors},
    mkp_api::{
        pagination::{Page, Pagination},
        product_objects::{ListingStatus, ProductDraft, ProductQueryFilter, ProductUpdate, SearchResults},
    },
    traits::{CatalogError, CatalogManagement},
};

const MAX_CATEGORY_NAME_LENGTH: usize = 100;

/// `CatalogApi` manages categories and product listings.
///
/// Anyone may browse the catalog. Only the seller of a product may change it, delete it or add images to it; any
/// other user gets a [`CatalogError::NotProductOwner`] error.
pub struct CatalogApi<B> {
    db: B,
}

impl<B: Debug> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi ({:?})", self.db)
    }
}

impl<B> CatalogApi<B>
where B: CatalogManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn categories(&self) -> Result<Vec<Category>, CatalogError> {
        self.db.fetch_categories().await
    }

    /// Creates a new category. The slug is derived from the name.
    pub async fn create_category(&self, name: &str, description: &str, icon: &str) -> Result<Category, CatalogError> {
        let name = name.trim();
        let mut errors = ValidationErrors::new();
        errors.require_non_blank("name", name);
        if name.chars().count() > MAX_CATEGORY_NAME_LENGTH {
            errors.add("name", format!("Ensure this field has no more than {MAX_CATEGORY_NAME_LENGTH} characters."));
        }
        let slug = slugify(name);
        if !name.is_empty() && slug.is_empty() {
            errors.add("name", "The name must contain at least one letter or digit.");
        }
        errors.into_result()?;
        let category = NewCategory {
            name: name.to_string(),
            slug,
            description: description.trim().to_string(),
            icon: icon.trim().to_string(),
        };
        self.db.insert_category(category).await
    }

    /// Lists a new product on behalf of the seller.
    pub async fn create_product(&self, seller_id: i64, draft: ProductDraft) -> Result<Product, CatalogError> {
        draft.validate()?;
        if let Some(category_id) = draft.category {
            self.check_category_exists(category_id).await?;
        }
        let product = self.db.insert_product(draft.into_new_product(seller_id)).await?;
        info!("🗃️ User #{seller_id} listed product #{} '{}'", product.id, product.title);
        Ok(product)
    }

    /// Fetches a product for display, counting the view.
    pub async fn view_product(&self, product_id: i64) -> Result<Product, CatalogError> {
        self.db.fetch_product_for_view(product_id).await?.ok_or(CatalogError::ProductNotFound(product_id))
    }

    /// Fetches a product without counting a view.
    pub async fn product(&self, product_id: i64) -> Result<Product, CatalogError> {
        self.db.fetch_product(product_id).await?.ok_or(CatalogError::ProductNotFound(product_id))
    }

    pub async fn update_product(
        &self,
        user_id: i64,
        product_id: i64,
        update: ProductUpdate,
    ) -> Result<Product, CatalogError> {
        let product = self.owned_product(user_id, product_id).await?;
        update.validate()?;
        if update.is_empty() {
            return Ok(product);
        }
        if let Some(category_id) = update.category {
            self.check_category_exists(category_id).await?;
        }
        let product = self.db.update_product(product_id, update).await?.ok_or(CatalogError::ProductNotFound(product_id))?;
        debug!("🗃️ Product #{product_id} updated by its seller");
        Ok(product)
    }

    pub async fn delete_product(&self, user_id: i64, product_id: i64) -> Result<(), CatalogError> {
        self.owned_product(user_id, product_id).await?;
        if self.db.delete_product(product_id).await? {
            Ok(())
        } else {
            Err(CatalogError::ProductNotFound(product_id))
        }
    }

    pub async fn list_products(
        &self,
        filter: ProductQueryFilter,
        pagination: Pagination,
    ) -> Result<Page<Product>, CatalogError> {
        let (products, count) = self.db.search_products(filter, pagination).await?;
        Ok(Page::new(products, count, pagination)?)
    }

    /// Free-text search. The query is matched against product titles, descriptions and category names, and is
    /// combined with any other criteria in `filter`. The response echoes the query and the filters in force.
    pub async fn search(
        &self,
        query: &str,
        filter: ProductQueryFilter,
        pagination: Pagination,
    ) -> Result<SearchResults, CatalogError> {
        let query = query.trim().to_string();
        let mut filter = filter.including_category_names();
        filter.search = (!query.is_empty()).then(|| query.clone());
        let filters_applied = filter.filters_applied();
        let page = self.list_products(filter, pagination).await?;
        Ok(SearchResults { page, query, filters_applied })
    }

    /// The seller's own listings, newest first.
    pub async fn my_listings(
        &self,
        seller_id: i64,
        status: ListingStatus,
        pagination: Pagination,
    ) -> Result<Page<Product>, CatalogError> {
        let filter = ProductQueryFilter::default().with_seller(seller_id).with_sold_status(status.is_sold());
        self.list_products(filter, pagination).await
    }

    pub async fn add_product_image(
        &self,
        user_id: i64,
        product_id: i64,
        image: NewProductImage,
    ) -> Result<ProductImage, CatalogError> {
        self.owned_product(user_id, product_id).await?;
        let mut errors = ValidationErrors::new();
        errors.require_non_blank("image_url", &image.image_url);
        if image.sort_order < 0 {
            errors.add("sort_order", "Ensure this value is greater than or equal to 0.");
        }
        errors.into_result()?;
        let image = self.db.insert_product_image(product_id, image).await?;
        debug!("🗃️ Image #{} added to product #{product_id}. Main: {}", image.id, image.is_main);
        Ok(image)
    }

    pub async fn product_images(&self, product_id: i64) -> Result<Vec<ProductImage>, CatalogError> {
        if self.db.fetch_product(product_id).await?.is_none() {
            return Err(CatalogError::ProductNotFound(product_id));
        }
        self.db.fetch_product_images(product_id).await
    }

    async fn owned_product(&self, user_id: i64, product_id: i64) -> Result<Product, CatalogError> {
        let product = self.product(product_id).await?;
        if product.seller_id != user_id {
            warn!("🗃️ User #{user_id} tried to modify product #{product_id}, which belongs to #{}", product.seller_id);
            return Err(CatalogError::NotProductOwner { user_id, product_id });
        }
        Ok(product)
    }

    async fn check_category_exists(&self, category_id: i64) -> Result<(), CatalogError> {
        match self.db.fetch_category(category_id).await? {
            Some(_) => Ok(()),
            None => Err(ValidationErrors::single(
                "category",
                format!("Invalid pk \"{category_id}\" - object does not exist."),
            )
            .into()),
        }
    }
}
