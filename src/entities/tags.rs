use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "tags")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Global vocabulary key; get-or-create relies on this constraint.
    #[sea_orm(unique)]
    pub title: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::ideas_tags::Entity")]
    IdeasTags,
}

impl Related<super::ideas_tags::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IdeasTags.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
