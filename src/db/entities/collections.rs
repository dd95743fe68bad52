//! Named, tagged groupings of generated items
use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue::Set, QueryOrder, entity::prelude::*};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "collections")]
/// A collection owned by one user
pub struct Model {
    #[sea_orm(primary_key)]
    /// db id
    pub id: i32,
    /// owning user
    pub owner_id: String,
    /// display name, unique per owner
    pub name: String,
    /// JSON array of style tags
    #[sea_orm(column_type = "Text")]
    pub tags: String,
    /// when it was created
    pub created_at: DateTimeUtc,
}

/// relations for collections
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::items::Entity")]
    /// items assigned to this collection
    Items,
}

impl Related<super::items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// What the API returns for a collection
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CollectionView {
    /// db id
    pub id: i32,
    /// display name
    pub name: String,
    /// style tags fed into image prompts
    pub tags: Vec<String>,
    /// when it was created
    pub created_at: DateTime<Utc>,
}

impl Model {
    /// Tags as a list; a malformed column reads as no tags.
    pub fn tag_list(&self) -> Vec<String> {
        serde_json::from_str(&self.tags).unwrap_or_default()
    }

    /// API representation.
    pub fn view(&self) -> CollectionView {
        CollectionView {
            id: self.id,
            name: self.name.clone(),
            tags: self.tag_list(),
            created_at: self.created_at,
        }
    }
}

fn clean_tags(tags: &[String]) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !cleaned.iter().any(|existing| existing == tag) {
            cleaned.push(tag.to_string());
        }
    }
    cleaned
}

/// Creates a collection; blank and duplicate tags are dropped.
pub async fn create<C: ConnectionTrait>(
    db: &C,
    owner_id: &str,
    name: &str,
    tags: &[String],
) -> Result<Model, DbErr> {
    let tags = serde_json::to_string(&clean_tags(tags))
        .map_err(|err| DbErr::Custom(format!("Failed to encode tags: {err}")))?;
    ActiveModel {
        owner_id: Set(owner_id.to_string()),
        name: Set(name.trim().to_string()),
        tags: Set(tags),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// All collections of one owner, by name.
pub async fn list_for_owner<C: ConnectionTrait>(
    db: &C,
    owner_id: &str,
) -> Result<Vec<Model>, DbErr> {
    Entity::find()
        .filter(Column::OwnerId.eq(owner_id))
        .order_by_asc(Column::Name)
        .all(db)
        .await
}

/// The collection with `id`, if it belongs to `owner_id`.
pub async fn find_for_owner<C: ConnectionTrait>(
    db: &C,
    owner_id: &str,
    id: i32,
) -> Result<Option<Model>, DbErr> {
    Entity::find_by_id(id)
        .filter(Column::OwnerId.eq(owner_id))
        .one(db)
        .await
}
