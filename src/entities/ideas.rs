use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "ideas")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub user_id: i32,
    pub created_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "Cascade",
        on_delete = "NoAction"
    )]
    User,
    #[sea_orm(has_many = "super::ideas_tags::Entity")]
    IdeasTags,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::ideas_tags::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IdeasTags.def()
    }
}

impl Related<super::tags::Entity> for Entity {
    fn to() -> RelationDef {
        super::ideas_tags::Relation::Tag.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::ideas_tags::Relation::Idea.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
