//! Accessors over a raw search page.
//!
//! No key of a page is guaranteed. Each accessor treats an absent key, an absent
//! parent, a non-array value, or an empty array the same way: an empty `Vec`.
//! None of them fail.
use serde_json::Value;

fn array_at(page: &Value, pointer: &str) -> Vec<Value> {
    page.pointer(pointer)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn take_array(page: &mut Value, pointer: &str) -> Vec<Value> {
    match page.pointer_mut(pointer).map(Value::take) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    }
}

/// Posts from `data`.
pub fn tweets(page: &Value) -> Vec<Value> {
    array_at(page, "/data")
}

pub fn users(page: &Value) -> Vec<Value> {
    array_at(page, "/includes/users")
}

pub fn places(page: &Value) -> Vec<Value> {
    array_at(page, "/includes/places")
}

/// Referenced posts from `includes.tweets`.
pub fn referenced_tweets(page: &Value) -> Vec<Value> {
    array_at(page, "/includes/tweets")
}

pub fn errors(page: &Value) -> Vec<Value> {
    array_at(page, "/errors")
}

pub fn media(page: &Value) -> Vec<Value> {
    array_at(page, "/includes/media")
}

/// `meta.next_token`, or `None` when absent, empty, or not a string.
pub fn next_token(page: &Value) -> Option<String> {
    page.pointer("/meta/next_token")
        .and_then(Value::as_str)
        .filter(|token| !token.is_empty())
        .map(str::to_owned)
}

/// All arrays of one page plus its continuation token.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageExtract {
    pub tweets: Vec<Value>,
    pub users: Vec<Value>,
    pub places: Vec<Value>,
    pub tweets_info: Vec<Value>,
    pub errors: Vec<Value>,
    pub media: Vec<Value>,
    pub next_token: Option<String>,
}

/// Split a page into its parts, moving the arrays out instead of cloning them.
pub fn extract_page(mut page: Value) -> PageExtract {
    let next_token = next_token(&page);
    PageExtract {
        tweets: take_array(&mut page, "/data"),
        users: take_array(&mut page, "/includes/users"),
        places: take_array(&mut page, "/includes/places"),
        tweets_info: take_array(&mut page, "/includes/tweets"),
        errors: take_array(&mut page, "/errors"),
        media: take_array(&mut page, "/includes/media"),
        next_token,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_page() -> Value {
        json!({
            "data": [{"id": "1", "text": "a"}, {"id": "2", "text": "b"}],
            "includes": {
                "users": [{"id": "42", "username": "alice"}],
                "places": [{"id": "p1", "full_name": "Manchester, England"}],
                "tweets": [{"id": "9", "text": "quoted"}],
                "media": [{"media_key": "3_a", "type": "photo"}]
            },
            "errors": [{"title": "Not Found Error"}],
            "meta": {"next_token": "b26v89c19zqg8o3f", "result_count": 2}
        })
    }

    #[test]
    fn empty_object_yields_nothing() {
        let page = json!({});
        assert!(tweets(&page).is_empty());
        assert!(users(&page).is_empty());
        assert!(places(&page).is_empty());
        assert!(referenced_tweets(&page).is_empty());
        assert!(errors(&page).is_empty());
        assert!(media(&page).is_empty());
        assert_eq!(next_token(&page), None);
    }

    #[test]
    fn includes_without_nested_keys_yields_nothing() {
        let page = json!({"includes": {}, "meta": {"result_count": 0}});
        assert!(users(&page).is_empty());
        assert!(media(&page).is_empty());
        assert_eq!(next_token(&page), None);
    }

    #[test]
    fn wrong_shapes_are_treated_as_missing() {
        let page = json!({
            "data": null,
            "includes": "nope",
            "errors": {"title": "not a list"},
            "meta": {"next_token": ""}
        });
        assert!(tweets(&page).is_empty());
        assert!(places(&page).is_empty());
        assert!(errors(&page).is_empty());
        assert_eq!(next_token(&page), None);

        let page = json!({"meta": {"next_token": 7}});
        assert_eq!(next_token(&page), None);
    }

    #[test]
    fn accessors_read_every_category() {
        let page = full_page();
        assert_eq!(tweets(&page).len(), 2);
        assert_eq!(users(&page)[0]["username"], "alice");
        assert_eq!(places(&page).len(), 1);
        assert_eq!(referenced_tweets(&page)[0]["id"], "9");
        assert_eq!(errors(&page).len(), 1);
        assert_eq!(media(&page)[0]["media_key"], "3_a");
        assert_eq!(next_token(&page).as_deref(), Some("b26v89c19zqg8o3f"));
    }

    #[test]
    fn extract_page_matches_the_accessors() {
        let page = full_page();
        let expected = PageExtract {
            tweets: tweets(&page),
            users: users(&page),
            places: places(&page),
            tweets_info: referenced_tweets(&page),
            errors: errors(&page),
            media: media(&page),
            next_token: next_token(&page),
        };
        assert_eq!(extract_page(page), expected);
    }
}
