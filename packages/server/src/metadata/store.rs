use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use super::{FileRecord, MetadataError, MetadataStore};
use crate::config::ListOrder;
use crate::entity::file_detail;

/// [`MetadataStore`] over the `filedetails` table.
#[derive(Clone)]
pub struct SeaOrmMetadataStore {
    db: DatabaseConnection,
}

impl SeaOrmMetadataStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MetadataStore for SeaOrmMetadataStore {
    async fn insert(&self, record: &FileRecord) -> Result<(), MetadataError> {
        let model = file_detail::ActiveModel {
            filename: Set(record.filename.clone()),
            filepath: Set(record.filepath.clone()),
            description: Set(record.description.clone()),
        };

        file_detail::Entity::insert(model)
            .exec_without_returning(&self.db)
            .await
            .map_err(|e| MetadataError::from_write(e, &record.filename))?;

        Ok(())
    }

    async fn select_all(&self, order: ListOrder) -> Result<Vec<FileRecord>, MetadataError> {
        let query = file_detail::Entity::find();
        let query = match order {
            ListOrder::Filename => query.order_by_asc(file_detail::Column::Filename),
            ListOrder::Unordered => query,
        };
        Ok(query.all(&self.db).await?)
    }

    async fn select_names(&self) -> Result<Vec<String>, MetadataError> {
        let names = file_detail::Entity::find()
            .select_only()
            .column(file_detail::Column::Filename)
            .into_tuple::<String>()
            .all(&self.db)
            .await?;
        Ok(names)
    }

    async fn update_name_and_description(
        &self,
        old_name: &str,
        new_name: &str,
        filepath: &str,
        description: &str,
    ) -> Result<FileRecord, MetadataError> {
        let result = file_detail::Entity::update_many()
            .col_expr(file_detail::Column::Filename, Expr::value(new_name))
            .col_expr(file_detail::Column::Filepath, Expr::value(filepath))
            .col_expr(file_detail::Column::Description, Expr::value(description))
            .filter(file_detail::Column::Filename.eq(old_name))
            .exec(&self.db)
            .await
            .map_err(|e| MetadataError::from_write(e, new_name))?;

        if result.rows_affected == 0 {
            return Err(MetadataError::NotFound(old_name.to_string()));
        }

        Ok(FileRecord {
            filename: new_name.to_string(),
            filepath: filepath.to_string(),
            description: description.to_string(),
        })
    }

    async fn delete_by_name(&self, name: &str) -> Result<(), MetadataError> {
        let result = file_detail::Entity::delete_by_id(name.to_string())
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(MetadataError::NotFound(name.to_string()));
        }
        Ok(())
    }
}
