use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "movie_entry")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub collection: String,
    pub movie_id: i64,
    pub title: String,
    pub release_date: String,
    #[sea_orm(column_type = "Text")]
    pub synopsis: String,
    #[sea_orm(column_type = "Double")]
    pub rating: f64,
    #[sea_orm(column_type = "Double")]
    pub popularity: f64,
    pub poster_url: String,
    pub thumb_url: Option<String>,
    pub inserted_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
