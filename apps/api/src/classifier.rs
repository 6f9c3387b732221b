//! Maps an inbound method and path to the action/resource pair recorded in
//! activity logs. Paths without a classification are simply not logged.

use axum::http::Method;

/// What an inbound request did, in activity-log vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub action: String,
    pub resource: String,
    pub resource_id: Option<String>,
}

/// Classifies a request, or returns `None` when it should not be logged.
///
/// Only `/api/{resource}` and `/api/{resource}/{id}` shapes are domain
/// traffic; operational surfaces (health, analytics, admin) are excluded.
pub fn classify_request(method: &Method, path: &str) -> Option<Classification> {
    let mut segments = path.trim_matches('/').split('/');
    if segments.next() != Some("api") {
        return None;
    }

    let resource = segments.next().filter(|value| !value.is_empty())?;
    if matches!(resource, "analytics" | "admin") {
        return None;
    }

    let resource_id = segments.next().filter(|value| !value.is_empty());
    if segments.next().is_some() {
        return None;
    }

    let action = match method.as_str() {
        "GET" => {
            if resource_id.is_some() {
                "view"
            } else {
                "list"
            }
        }
        "POST" => "create",
        "PUT" | "PATCH" => "update",
        "DELETE" => "delete",
        _ => return None,
    };

    Some(Classification {
        action: action.to_owned(),
        resource: resource.to_owned(),
        resource_id: resource_id.map(str::to_owned),
    })
}

#[cfg(test)]
mod tests {
    use axum::http::Method;

    use super::classify_request;

    #[test]
    fn collection_get_is_a_list_action() {
        let classified = classify_request(&Method::GET, "/api/students");
        let Some(classified) = classified else {
            panic!("expected a classification");
        };
        assert_eq!(classified.action, "list");
        assert_eq!(classified.resource, "students");
        assert!(classified.resource_id.is_none());
    }

    #[test]
    fn item_delete_carries_the_resource_id() {
        let classified = classify_request(&Method::DELETE, "/api/students/st-1");
        let Some(classified) = classified else {
            panic!("expected a classification");
        };
        assert_eq!(classified.action, "delete");
        assert_eq!(classified.resource_id.as_deref(), Some("st-1"));
    }

    #[test]
    fn operational_surfaces_are_never_logged() {
        assert!(classify_request(&Method::GET, "/healthz").is_none());
        assert!(classify_request(&Method::GET, "/api/analytics/usage").is_none());
        assert!(classify_request(&Method::POST, "/api/admin/activity-logs").is_none());
    }

    #[test]
    fn deep_paths_and_unknown_methods_are_ignored() {
        assert!(classify_request(&Method::GET, "/api/students/st-1/grades").is_none());
        assert!(classify_request(&Method::OPTIONS, "/api/students").is_none());
    }
}
