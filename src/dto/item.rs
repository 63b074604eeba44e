//! Item payloads and the generic info/list/details containers wrapping them.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use crate::{
    dto::{
        common::{ServerForm, Srl, Tag},
        leaderboard::ServerItemLeaderboard,
        validation::{finish, require_name, validate_each, validate_page_count},
    },
    state::{catalog::CatalogItem, category::ItemCategory},
};

/// A post shown in the posts category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostItem {
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub version: u32,
    #[validate(length(min = 1))]
    pub title: String,
    /// Publication time in milliseconds since the Unix epoch.
    pub time: i64,
    pub author: String,
    #[validate(nested)]
    pub tags: Vec<Tag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(nested)]
    pub thumbnail: Option<Srl>,
    /// Long description, returned in details only.
    #[serde(skip)]
    pub description: String,
}

impl PostItem {
    /// Post with the current item version and no tags or thumbnail.
    pub fn new(
        name: impl Into<String>,
        title: impl Into<String>,
        author: impl Into<String>,
        time: i64,
    ) -> Self {
        Self {
            name: name.into(),
            source: None,
            version: 1,
            title: title.into(),
            time,
            author: author.into(),
            tags: Vec::new(),
            thumbnail: None,
            description: String::new(),
        }
    }
}

impl CatalogItem for PostItem {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Titled group of items shown on an info or details page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerItemSection<T> {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub item_type: ItemCategory,
    pub items: Vec<T>,
}

impl<T: Validate> Validate for ServerItemSection<T> {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        require_name(&mut errors, "title", &self.title);
        validate_each(&mut errors, "items", &self.items);
        finish(errors)
    }
}

/// Landing page of a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerItemInfo<T> {
    pub searches: Vec<ServerForm>,
    pub sections: Vec<ServerItemSection<T>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<Srl>,
}

impl<T: Validate> Validate for ServerItemInfo<T> {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validate_each(&mut errors, "searches", &self.searches);
        validate_each(&mut errors, "sections", &self.sections);
        if let Some(banner) = &self.banner {
            validate_each(&mut errors, "banner", std::slice::from_ref(banner));
        }
        finish(errors)
    }
}

/// One page of a category listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerItemList<T> {
    pub page_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
    pub items: Vec<T>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub searches: Vec<ServerForm>,
}

impl<T: Validate> Validate for ServerItemList<T> {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validate_page_count(&mut errors, self.page_count);
        validate_each(&mut errors, "items", &self.items);
        validate_each(&mut errors, "searches", &self.searches);
        finish(errors)
    }
}

/// Everything the client shows on an item page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerItemDetails<T> {
    pub item: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub actions: Vec<ServerForm>,
    pub has_community: bool,
    pub leaderboards: Vec<ServerItemLeaderboard>,
    pub sections: Vec<ServerItemSection<T>>,
}

impl<T: Validate> ServerItemDetails<T> {
    /// Details without actions, community or leaderboards.
    pub fn plain(item: T, description: Option<String>) -> Self {
        Self {
            item,
            description,
            actions: Vec::new(),
            has_community: false,
            leaderboards: Vec::new(),
            sections: Vec::new(),
        }
    }
}

impl<T: Validate> Validate for ServerItemDetails<T> {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        validate_each(&mut errors, "item", std::slice::from_ref(&self.item));
        validate_each(&mut errors, "actions", &self.actions);
        validate_each(&mut errors, "leaderboards", &self.leaderboards);
        validate_each(&mut errors, "sections", &self.sections);
        finish(errors)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn post(name: &str) -> PostItem {
        PostItem::new(name, "Title", "author", 1_700_000_000_000)
    }

    #[test]
    fn post_serializes_with_wire_names() {
        let mut item = post("p1");
        item.description = "hidden".into();
        let value = serde_json::to_value(&item).unwrap();

        assert_eq!(
            value,
            json!({
                "name": "p1",
                "version": 1,
                "title": "Title",
                "time": 1_700_000_000_000_i64,
                "author": "author",
                "tags": []
            })
        );
    }

    #[test]
    fn list_requires_positive_page_count() {
        let list = ServerItemList {
            page_count: 0,
            cursor: None,
            items: vec![post("p1")],
            searches: Vec::new(),
        };
        assert!(list.validate().is_err());

        let list = ServerItemList {
            page_count: 1,
            ..list
        };
        assert!(list.validate().is_ok());
        assert_eq!(serde_json::to_value(&list).unwrap()["pageCount"], 1);
    }

    #[test]
    fn nested_invalid_items_fail_details() {
        let details = ServerItemDetails::plain(post(""), None);
        let err = details.validate().unwrap_err();
        assert!(err.to_string().contains("item[0]"));
    }

    #[test]
    fn info_sections_carry_item_type() {
        let info = ServerItemInfo {
            searches: Vec::new(),
            sections: vec![ServerItemSection {
                title: "Newest".into(),
                icon: None,
                item_type: ItemCategory::Post,
                items: vec![post("p1")],
            }],
            banner: None,
        };
        assert!(info.validate().is_ok());

        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["sections"][0]["itemType"], "post");
        assert!(value.get("banner").is_none());
    }
}
