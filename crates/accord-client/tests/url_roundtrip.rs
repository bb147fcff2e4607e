//! URLs built by the client match back to the same parameters on the server side.

use std::collections::BTreeMap;

use accord_client::build_url;
use accord_core::Route;
use proptest::prelude::*;
use serde_json::Value;

fn path_of(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

proptest! {
    #[test]
    fn prop_required_params_round_trip(id in "\\PC{1,16}", name in "\\PC{1,16}") {
        let route = Route::get("/users/:id/files/:name").build().unwrap();
        let params = BTreeMap::from([
            ("id".to_string(), id.clone()),
            ("name".to_string(), name.clone()),
        ]);
        let url = build_url(&route, "", &params, &Value::Null, false).unwrap();

        let matched = route.template().match_path(path_of(&url)).unwrap();
        prop_assert_eq!(matched.get("id"), Some(id.as_str()));
        prop_assert_eq!(matched.get("name"), Some(name.as_str()));
    }

    #[test]
    fn prop_optional_param_round_trip(tab in proptest::option::of("\\PC{1,16}")) {
        let route = Route::get("/users/:id/:tab?").build().unwrap();
        let mut params = BTreeMap::from([("id".to_string(), "7".to_string())]);
        if let Some(tab) = &tab {
            params.insert("tab".to_string(), tab.clone());
        }
        let url = build_url(&route, "http://api.test", &params, &Value::Null, false).unwrap();
        let path = path_of(url.strip_prefix("http://api.test").unwrap());

        let matched = route.template().match_path(path).unwrap();
        prop_assert_eq!(matched.get("id"), Some("7"));
        prop_assert_eq!(matched.get("tab"), tab.as_deref());
    }
}
