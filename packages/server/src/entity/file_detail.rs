use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Metadata row for one stored blob.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "filedetails")]
pub struct Model {
    /// Blob name, including the upload timestamp prefix.
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub filename: String,

    /// Where the blob store placed the bytes. Never client-supplied.
    #[sea_orm(column_type = "Text")]
    pub filepath: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,
}

impl ActiveModelBehavior for ActiveModel {}
