use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, Set,
    TransactionTrait, sea_query::OnConflict,
};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::time::Duration;

use crate::db::{StoreError, StoreResult, bounded};
use crate::domain::{Idea, IdeaId, NewIdea, Tag, UserId};
use crate::entities::{ideas, ideas_tags, prelude::*, tags};

/// One row of the ideas ⟕ ideas_tags ⟕ tags join.
#[derive(Debug, Clone, FromQueryResult)]
pub struct IdeaTagRow {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
    pub tag_title: Option<String>,
}

/// Fold the flat join stream back into one [`Idea`] per distinct id.
///
/// Ideas keep the order in which their first row appears, tags the order of
/// their rows.
#[must_use]
pub fn assemble_ideas(rows: impl IntoIterator<Item = IdeaTagRow>) -> Vec<Idea> {
    let mut ideas: Vec<Idea> = Vec::new();
    let mut positions: HashMap<i32, usize> = HashMap::new();

    for row in rows {
        let index = match positions.entry(row.id) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                ideas.push(Idea {
                    id: IdeaId::new(row.id),
                    title: row.title,
                    description: row.description,
                    user_id: UserId::new(row.user_id),
                    tags: Vec::new(),
                    created_at: row.created_at,
                });
                *entry.insert(ideas.len() - 1)
            }
        };

        if let Some(title) = row.tag_title
            && let Some(idea) = ideas.get_mut(index)
        {
            idea.tags.push(Tag { title });
        }
    }

    ideas
}

pub struct IdeaRepository {
    conn: DatabaseConnection,
    timeout: Duration,
}

impl IdeaRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection, timeout: Duration) -> Self {
        Self { conn, timeout }
    }

    /// Insert the idea, get-or-create its tags and link them, all in one
    /// transaction. A failure at any step leaves nothing behind. Tags come
    /// back sorted by title, as [`Self::get`] returns them.
    pub async fn insert(&self, new_idea: &NewIdea) -> StoreResult<Idea> {
        bounded(self.timeout, self.insert_unbounded(new_idea)).await
    }

    async fn insert_unbounded(&self, new_idea: &NewIdea) -> StoreResult<Idea> {
        let txn = self.conn.begin().await?;

        let idea = ideas::ActiveModel {
            title: Set(new_idea.title.clone()),
            description: Set(new_idea.description.clone()),
            user_id: Set(new_idea.author.value()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let mut tag_models = get_or_create_tags(&txn, &new_idea.tags).await?;
        tag_models.sort_by(|a, b| a.title.cmp(&b.title));

        if !tag_models.is_empty() {
            let links = tag_models.iter().map(|tag| ideas_tags::ActiveModel {
                idea_id: Set(idea.id),
                tag_id: Set(tag.id),
            });
            IdeasTags::insert_many(links)
                .exec_without_returning(&txn)
                .await?;
        }

        txn.commit().await?;

        Ok(Idea {
            id: IdeaId::new(idea.id),
            title: idea.title,
            description: idea.description,
            user_id: UserId::new(idea.user_id),
            tags: tag_models
                .into_iter()
                .map(|tag| Tag { title: tag.title })
                .collect(),
            created_at: idea.created_at,
        })
    }

    /// Every idea with its tags, newest first.
    pub async fn list(&self) -> StoreResult<Vec<Idea>> {
        bounded(self.timeout, async move {
            let rows = joined_select()
                .into_model::<IdeaTagRow>()
                .all(&self.conn)
                .await
                .map_err(StoreError::from)?;
            Ok::<_, StoreError>(assemble_ideas(rows))
        })
        .await
    }

    pub async fn get(&self, id: IdeaId) -> StoreResult<Idea> {
        bounded(self.timeout, async move {
            let rows = joined_select()
                .filter(ideas::Column::Id.eq(id.value()))
                .into_model::<IdeaTagRow>()
                .all(&self.conn)
                .await
                .map_err(StoreError::from)?;

            assemble_ideas(rows)
                .into_iter()
                .next()
                .ok_or(StoreError::NotFound)
        })
        .await
    }

    /// Delete an idea only if `owner` created it. Ownership is part of the
    /// delete predicate, so a non-owner gets [`StoreError::NotFound`].
    pub async fn delete(&self, id: IdeaId, owner: UserId) -> StoreResult<()> {
        bounded(self.timeout, self.delete_unbounded(id, owner)).await
    }

    async fn delete_unbounded(&self, id: IdeaId, owner: UserId) -> StoreResult<()> {
        let txn = self.conn.begin().await?;

        let deleted = Ideas::delete_many()
            .filter(ideas::Column::Id.eq(id.value()))
            .filter(ideas::Column::UserId.eq(owner.value()))
            .exec(&txn)
            .await?;

        if deleted.rows_affected == 0 {
            return Err(StoreError::NotFound);
        }

        // Covers backends running without foreign key enforcement.
        IdeasTags::delete_many()
            .filter(ideas_tags::Column::IdeaId.eq(id.value()))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(())
    }

    /// Number of stored tag rows carrying `title`. Used to check deduplication.
    pub async fn count_tags_titled(&self, title: &str) -> StoreResult<usize> {
        bounded(self.timeout, async move {
            Tags::find()
                .filter(tags::Column::Title.eq(title))
                .all(&self.conn)
                .await
                .map(|rows| rows.len())
                .map_err(StoreError::from)
        })
        .await
    }
}

fn joined_select() -> Select<Ideas> {
    Ideas::find()
        .select_only()
        .column(ideas::Column::Id)
        .column(ideas::Column::Title)
        .column(ideas::Column::Description)
        .column(ideas::Column::UserId)
        .column(ideas::Column::CreatedAt)
        .column_as(tags::Column::Title, "tag_title")
        .join(JoinType::LeftJoin, ideas::Relation::IdeasTags.def())
        .join(JoinType::LeftJoin, ideas_tags::Relation::Tag.def())
        .order_by_desc(ideas::Column::CreatedAt)
        .order_by_desc(ideas::Column::Id)
        .order_by_asc(tags::Column::Title)
}

/// Insert-ignore-then-select against the unique `tags.title` constraint.
/// Returns one model per distinct title, in request order.
async fn get_or_create_tags<C>(conn: &C, titles: &[String]) -> StoreResult<Vec<tags::Model>>
where
    C: ConnectionTrait,
{
    let mut distinct: Vec<&String> = Vec::with_capacity(titles.len());
    for title in titles {
        if !distinct.contains(&title) {
            distinct.push(title);
        }
    }

    if distinct.is_empty() {
        return Ok(Vec::new());
    }

    let candidates = distinct.iter().map(|title| tags::ActiveModel {
        title: Set((*title).clone()),
        ..Default::default()
    });

    Tags::insert_many(candidates)
        .on_conflict(
            OnConflict::column(tags::Column::Title)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;

    let mut by_title: HashMap<String, tags::Model> = Tags::find()
        .filter(tags::Column::Title.is_in(distinct.iter().map(|t| (*t).clone())))
        .all(conn)
        .await?
        .into_iter()
        .map(|model| (model.title.clone(), model))
        .collect();

    distinct
        .into_iter()
        .map(|title| by_title.remove(title).ok_or(StoreError::NotFound))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Store;

    fn row(id: i32, title: &str, tag: Option<&str>) -> IdeaTagRow {
        IdeaTagRow {
            id,
            title: title.to_string(),
            description: format!("{title} description"),
            user_id: 1,
            created_at: Utc::now(),
            tag_title: tag.map(str::to_string),
        }
    }

    #[test]
    fn assemble_merges_rows_per_idea() {
        let ideas = assemble_ideas(vec![
            row(2, "second", Some("go")),
            row(2, "second", Some("frontend")),
            row(1, "first", Some("backend")),
            row(1, "first", Some("go")),
        ]);

        assert_eq!(ideas.len(), 2);
        assert_eq!(ideas[0].id, IdeaId::new(2));
        assert_eq!(ideas[1].id, IdeaId::new(1));

        let titles: Vec<&str> = ideas[0].tags.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["go", "frontend"]);
    }

    #[test]
    fn assemble_keeps_untagged_ideas() {
        let ideas = assemble_ideas(vec![row(5, "lonely", None)]);
        assert_eq!(ideas.len(), 1);
        assert!(ideas[0].tags.is_empty());
    }

    #[test]
    fn assemble_handles_empty_stream() {
        assert!(assemble_ideas(Vec::new()).is_empty());
    }

    async fn store_with_author() -> (Store, UserId) {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let user = store
            .user_repo()
            .insert("author", "author@example.com", "hash")
            .await
            .unwrap();
        (store, user.id)
    }

    fn new_idea(author: UserId, title: &str, tags: &[&str]) -> NewIdea {
        NewIdea {
            title: title.to_string(),
            description: "something worth building".to_string(),
            author,
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn shared_tags_are_stored_once() {
        let (store, author) = store_with_author().await;
        let repo = store.idea_repo();

        repo.insert(&new_idea(author, "first", &["go", "backend"]))
            .await
            .unwrap();
        repo.insert(&new_idea(author, "second", &["go", "frontend"]))
            .await
            .unwrap();

        assert_eq!(repo.count_tags_titled("go").await.unwrap(), 1);

        let ideas = repo.list().await.unwrap();
        assert_eq!(ideas.len(), 2);
        assert_eq!(ideas[0].title, "second");
        assert_eq!(ideas[1].title, "first");

        let mut second: Vec<&str> = ideas[0].tags.iter().map(|t| t.title.as_str()).collect();
        second.sort_unstable();
        assert_eq!(second, vec!["frontend", "go"]);

        let mut first: Vec<&str> = ideas[1].tags.iter().map(|t| t.title.as_str()).collect();
        first.sort_unstable();
        assert_eq!(first, vec!["backend", "go"]);
    }

    #[tokio::test]
    async fn get_returns_idea_with_tags() {
        let (store, author) = store_with_author().await;
        let repo = store.idea_repo();

        let created = repo
            .insert(&new_idea(author, "solo", &["web", "rust", "cli"]))
            .await
            .unwrap();
        let titles: Vec<&str> = created.tags.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["cli", "rust", "web"]);

        let fetched = repo.get(created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert!(matches!(
            repo.get(IdeaId::new(9999)).await,
            Err(StoreError::NotFound)
        ));
    }

    #[tokio::test]
    async fn failed_link_step_leaves_no_partial_idea() {
        let (store, author) = store_with_author().await;
        let repo = store.idea_repo();

        store
            .conn
            .execute_unprepared("DROP TABLE ideas_tags")
            .await
            .unwrap();

        assert!(
            repo.insert(&new_idea(author, "doomed", &["fresh"]))
                .await
                .is_err()
        );

        assert_eq!(Ideas::find().all(&store.conn).await.unwrap().len(), 0);
        assert_eq!(Tags::find().all(&store.conn).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn delete_requires_owner() {
        let (store, author) = store_with_author().await;
        let stranger = store
            .user_repo()
            .insert("stranger", "stranger@example.com", "hash")
            .await
            .unwrap();
        let repo = store.idea_repo();

        let idea = repo
            .insert(&new_idea(author, "mine", &["rust"]))
            .await
            .unwrap();

        let err = repo.delete(idea.id, stranger.id).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound));
        assert!(repo.get(idea.id).await.is_ok());

        repo.delete(idea.id, author).await.unwrap();
        assert!(matches!(repo.get(idea.id).await, Err(StoreError::NotFound)));
        assert!(matches!(
            repo.delete(idea.id, author).await,
            Err(StoreError::NotFound)
        ));
    }
}
