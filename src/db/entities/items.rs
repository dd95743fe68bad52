//! DB storage for generated items
use std::collections::BTreeMap;

use sea_orm::sea_query::{Alias, Expr, Query};
use sea_orm::{
    ActiveValue::Set, IntoActiveModel, PaginatorTrait, QueryOrder, StatementBuilder,
    entity::prelude::*,
};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::item::GeneratedItem;
use crate::rarity::RarityTier;
use crate::sampler::SampledTraits;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "items")]
/// A persisted generation
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    /// UUID v7, as text
    pub id: String,
    /// owning user
    pub owner_id: String,
    /// image prompt
    #[sea_orm(column_type = "Text")]
    pub prompt: String,
    /// video prompt
    #[sea_orm(column_type = "Text")]
    pub video_prompt: String,
    /// simulated ETH value
    pub value_eth: f64,
    /// when it was generated
    pub created_at: DateTimeUtc,
    /// public reference to the stored image
    pub image_url: Option<String>,
    /// resolved tier
    pub rarity: RarityTier,
    /// sampled character
    pub character: String,
    /// sampled action
    pub action: String,
    /// sampled background
    pub background: String,
    /// sampled color scheme
    pub color_scheme: String,
    /// JSON array of effects
    #[sea_orm(column_type = "Text")]
    pub effects: String,
    /// user-toggled favorite flag
    pub is_favorite: bool,
    /// optional collection
    pub collection_id: Option<i32>,
}

/// relations for items
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::collections::Entity",
        from = "Column::CollectionId",
        to = "super::collections::Column::Id",
        on_delete = "SetNull"
    )]
    /// foreign key relation to collections
    Collections,
}

impl Related<super::collections::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Collections.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for GeneratedItem {
    type Error = DbErr;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&model.id)
            .map_err(|err| DbErr::Custom(format!("Invalid item id {}: {err}", model.id)))?;
        let effects: Vec<String> = serde_json::from_str(&model.effects)
            .map_err(|err| DbErr::Custom(format!("Invalid effects for item {id}: {err}")))?;
        Ok(GeneratedItem {
            id,
            owner_id: model.owner_id,
            prompt: model.prompt,
            video_prompt: model.video_prompt,
            value_eth: model.value_eth,
            created_at: model.created_at,
            image_url: model.image_url,
            rarity: model.rarity,
            traits: SampledTraits {
                character: model.character,
                action: model.action,
                background: model.background,
                color_scheme: model.color_scheme,
                effects,
            },
            is_favorite: model.is_favorite,
            collection_id: model.collection_id,
        })
    }
}

/// Filters and paging for listing an owner's items.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ItemQuery {
    /// 1-based page number
    pub page: u64,
    /// items per page, clamped to `1..=MAX_PAGE_SIZE`
    pub per_page: u64,
    /// only favorites
    pub favorites: bool,
    /// only this tier
    pub rarity: Option<RarityTier>,
    /// only this collection
    pub collection_id: Option<i32>,
}

impl Default for ItemQuery {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PAGE_SIZE,
            favorites: false,
            rarity: None,
            collection_id: None,
        }
    }
}

/// One page of items, newest first.
#[derive(Clone, Debug, Serialize)]
pub struct ItemPage {
    /// the items on this page
    pub items: Vec<GeneratedItem>,
    /// 1-based page number
    pub page: u64,
    /// page size used
    pub per_page: u64,
    /// matching items across all pages
    pub total_items: u64,
    /// number of pages
    pub total_pages: u64,
}

/// Aggregate statistics for one owner.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OwnerStats {
    /// number of items
    pub total_items: u64,
    /// summed simulated value
    pub total_value_eth: f64,
    /// number of favorited items
    pub favorites: u64,
    /// item count per tier, every tier present
    pub by_rarity: BTreeMap<RarityTier, u64>,
}

/// Records a freshly generated item.
pub async fn insert<C: ConnectionTrait>(db: &C, item: &GeneratedItem) -> Result<(), DbErr> {
    let effects = serde_json::to_string(&item.traits.effects)
        .map_err(|err| DbErr::Custom(format!("Failed to encode effects: {err}")))?;
    ActiveModel {
        id: Set(item.id.to_string()),
        owner_id: Set(item.owner_id.clone()),
        prompt: Set(item.prompt.clone()),
        video_prompt: Set(item.video_prompt.clone()),
        value_eth: Set(item.value_eth),
        created_at: Set(item.created_at),
        image_url: Set(item.image_url.clone()),
        rarity: Set(item.rarity),
        character: Set(item.traits.character.clone()),
        action: Set(item.traits.action.clone()),
        background: Set(item.traits.background.clone()),
        color_scheme: Set(item.traits.color_scheme.clone()),
        effects: Set(effects),
        is_favorite: Set(item.is_favorite),
        collection_id: Set(item.collection_id),
    }
    .insert(db)
    .await?;
    Ok(())
}

/// The item with `id`, if it belongs to `owner_id`.
pub async fn find_for_owner<C: ConnectionTrait>(
    db: &C,
    owner_id: &str,
    id: &Uuid,
) -> Result<Option<Model>, DbErr> {
    Entity::find_by_id(id.to_string())
        .filter(Column::OwnerId.eq(owner_id))
        .one(db)
        .await
}

/// Lists an owner's items, newest first.
pub async fn list_for_owner<C: ConnectionTrait>(
    db: &C,
    owner_id: &str,
    query: &ItemQuery,
) -> Result<ItemPage, DbErr> {
    let per_page = query.per_page.clamp(1, MAX_PAGE_SIZE);
    let page = query.page.max(1);

    let mut select = Entity::find().filter(Column::OwnerId.eq(owner_id));
    if query.favorites {
        select = select.filter(Column::IsFavorite.eq(true));
    }
    if let Some(rarity) = query.rarity {
        select = select.filter(Column::Rarity.eq(rarity));
    }
    if let Some(collection_id) = query.collection_id {
        select = select.filter(Column::CollectionId.eq(collection_id));
    }

    let paginator = select
        .order_by_desc(Column::CreatedAt)
        .order_by_desc(Column::Id)
        .paginate(db, per_page);
    let totals = paginator.num_items_and_pages().await?;
    let items = paginator
        .fetch_page(page - 1)
        .await?
        .into_iter()
        .map(GeneratedItem::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ItemPage {
        items,
        page,
        per_page,
        total_items: totals.number_of_items,
        total_pages: totals.number_of_pages,
    })
}

/// Flips the favorite flag, returning the new value, or `None` if not found.
pub async fn toggle_favorite<C: ConnectionTrait>(
    db: &C,
    owner_id: &str,
    id: &Uuid,
) -> Result<Option<bool>, DbErr> {
    let Some(model) = find_for_owner(db, owner_id, id).await? else {
        return Ok(None);
    };
    let is_favorite = !model.is_favorite;
    let mut am = model.into_active_model();
    am.is_favorite = Set(is_favorite);
    am.update(db).await?;
    Ok(Some(is_favorite))
}

/// Moves an item into a collection, or out of any with `None`. Returns false
/// if the item does not exist for this owner.
pub async fn set_collection<C: ConnectionTrait>(
    db: &C,
    owner_id: &str,
    id: &Uuid,
    collection_id: Option<i32>,
) -> Result<bool, DbErr> {
    let Some(model) = find_for_owner(db, owner_id, id).await? else {
        return Ok(false);
    };
    let mut am = model.into_active_model();
    am.collection_id = Set(collection_id);
    am.update(db).await?;
    Ok(true)
}

/// Deletes an item, returning false if it did not exist for this owner.
pub async fn delete<C: ConnectionTrait>(db: &C, owner_id: &str, id: &Uuid) -> Result<bool, DbErr> {
    let result = Entity::delete_many()
        .filter(Column::Id.eq(id.to_string()))
        .filter(Column::OwnerId.eq(owner_id))
        .exec(db)
        .await?;
    Ok(result.rows_affected > 0)
}

/// Counts, value, and per-tier breakdown for one owner.
pub async fn owner_stats<C: ConnectionTrait>(db: &C, owner_id: &str) -> Result<OwnerStats, DbErr> {
    let query = Query::select()
        .from(Entity)
        .column(Column::Rarity)
        .expr_as(Expr::col(Column::Id).count(), Alias::new("item_count"))
        .expr_as(Expr::col(Column::ValueEth).sum(), Alias::new("total_value"))
        .and_where(Expr::col(Column::OwnerId).eq(owner_id))
        .group_by_col(Column::Rarity)
        .to_owned();
    let stmt = StatementBuilder::build(&query, &db.get_database_backend());
    let rows = db.query_all(stmt).await?;

    let mut by_rarity: BTreeMap<RarityTier, u64> =
        RarityTier::ALL.iter().map(|tier| (*tier, 0)).collect();
    let mut total_items = 0;
    let mut total_value_eth = 0.0;
    for row in rows {
        let code: String = row.try_get("", "rarity")?;
        let count: i64 = row.try_get("", "item_count")?;
        let value: f64 = row.try_get("", "total_value")?;
        let tier = RarityTier::from_code(&code)
            .ok_or_else(|| DbErr::Custom(format!("Unknown rarity code {code}")))?;
        let count = u64::try_from(count).unwrap_or_default();
        by_rarity.insert(tier, count);
        total_items += count;
        total_value_eth += value;
    }

    let favorites = Entity::find()
        .filter(Column::OwnerId.eq(owner_id))
        .filter(Column::IsFavorite.eq(true))
        .count(db)
        .await?;

    Ok(OwnerStats {
        total_items,
        total_value_eth,
        favorites,
        by_rarity,
    })
}
