use std::sync::{Arc, Mutex};

use serde_json::json;
use vrouter::component::{ComponentPayload, ComponentRef};
use vrouter::config::RuntimeConfig;
use vrouter::route::{RouteId, RouteNode};
use vrouter::router::{RouterInstance, RouterOptions};
use vrouter::RouterError;

struct Components {
    foo: ComponentRef,
    bar: ComponentRef,
    baz: ComponentRef,
    qux: ComponentRef,
}

fn components() -> Components {
    Components {
        foo: ComponentRef::named("Foo"),
        bar: ComponentRef::named("Bar"),
        baz: ComponentRef::named("Baz"),
        qux: ComponentRef::named("Qux"),
    }
}

fn scenario(c: &Components) -> Vec<RouteNode> {
    vec![
        RouteNode::new("/foo", c.foo.clone()),
        RouteNode::new("/bar", c.bar.clone())
            .child(RouteNode::new("", c.baz.clone()))
            .child(RouteNode::new("qux", c.qux.clone())),
    ]
}

#[test]
fn test_scenario_replace_sequence() {
    let c = components();
    let router = RouterInstance::create(
        "main",
        &scenario(&c),
        RouterOptions::default().with_initial_path("/foo"),
    )
    .unwrap();

    assert_eq!(&router.route().render_list[..], &[c.foo.clone()]);

    router.replace("/bar").unwrap();
    assert_eq!(&router.route().render_list[..], &[c.bar.clone(), c.baz.clone()]);

    router.replace("/bar/qux").unwrap();
    assert_eq!(&router.route().render_list[..], &[c.bar.clone(), c.qux.clone()]);
}

#[test]
fn test_repeated_resolution_is_identity_stable() {
    let c = components();
    let router = RouterInstance::create("main", &scenario(&c), RouterOptions::default()).unwrap();

    router.replace("/bar/qux").unwrap();
    let first = router.route().render_list.clone();
    router.replace("/bar/qux?again=1").unwrap();
    let second = router.route().render_list.clone();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(router.cache_stats().hits, 1);
}

#[test]
fn test_render_list_length_is_depth_plus_one() {
    let a = ComponentRef::named("A");
    let b = ComponentRef::named("B");
    let c = ComponentRef::named("C");
    let routes = vec![RouteNode::new("/a", a.clone())
        .child(RouteNode::new("b", b.clone()).child(RouteNode::new("c", c.clone())))];
    let router = RouterInstance::create(
        "abc",
        &routes,
        RouterOptions::default().with_initial_path("/a/b/c"),
    )
    .unwrap();

    let route = router.route();
    let matched = route.matched.clone().unwrap();
    assert_eq!(matched, RouteId::new("/a/b/c", 2));
    assert_eq!(route.render_list.len(), matched.depth() + 1);
    assert_eq!(&route.render_list[..], &[a.clone(), b.clone(), c.clone()]);
    assert_eq!(route.component_at(0), Some(&a));
    assert_eq!(route.component_at(2), Some(&c));
    assert!(route.component_at(3).is_none());
}

#[test]
fn test_default_child_meta_wins() {
    let parent = ComponentRef::named("Parent");
    let child = ComponentRef::named("Child");
    let routes = vec![RouteNode::new("/parent", parent.clone())
        .meta_entry("foo", "bar")
        .child(RouteNode::new("", child.clone()).meta_entry("foo", "baz"))];
    let router = RouterInstance::create(
        "shadow",
        &routes,
        RouterOptions::default().with_initial_path("/parent"),
    )
    .unwrap();

    let route = router.route();
    assert_eq!(&route.render_list[..], &[parent, child]);
    assert_eq!(route.meta.as_ref().unwrap().get("foo"), Some(&json!("baz")));
}

#[test]
fn test_url_decomposition() {
    let c = components();
    let router = RouterInstance::create(
        "url",
        &scenario(&c),
        RouterOptions::default().with_initial_path("/bar?x=1#frag"),
    )
    .unwrap();

    let route = router.route();
    assert_eq!(route.path, "/bar");
    assert_eq!(route.search, "?x=1");
    assert_eq!(route.hash, "#frag");
    assert_eq!(route.full_path, "/bar?x=1#frag");
    assert_eq!(route.query(), vec![("x".to_string(), "1".to_string())]);
}

#[test]
fn test_snapshot_observers_see_every_change() {
    let c = components();
    let router = RouterInstance::create("observed", &scenario(&c), RouterOptions::default()).unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    router
        .route_signal()
        .subscribe(move |route| sink.lock().unwrap().push(route.path.clone()));

    router.replace("/foo").unwrap();
    router.replace("/foo").unwrap();
    router.replace("/bar").unwrap();

    assert_eq!(*seen.lock().unwrap(), vec!["/foo".to_string(), "/bar".to_string()]);
}

#[test]
fn test_params_are_decoded() {
    let routes = vec![
        RouteNode::new("/users/:id", ComponentRef::named("User")),
        RouteNode::new("/files/**:path", ComponentRef::named("File")),
    ];
    let router = RouterInstance::create("params", &routes, RouterOptions::default()).unwrap();

    router.replace("/users/j%C3%BCrgen").unwrap();
    assert_eq!(router.route().param("id"), Some("jürgen"));

    router.replace("/files/a/b%20c.txt").unwrap();
    assert_eq!(router.route().param("path"), Some("a/b c.txt"));

    router.replace("/users/1?tab=posts").unwrap();
    let route = router.route();
    assert_eq!(route.params.as_ref().unwrap().len(), 1);
}

#[test]
fn test_static_route_has_no_params() {
    let c = components();
    let router = RouterInstance::create("static", &scenario(&c), RouterOptions::default()).unwrap();
    router.replace("/foo").unwrap();
    assert!(router.route().params.is_none());
}

#[test]
fn test_lazy_component_loads_once_through_render_list() {
    let loads = Arc::new(Mutex::new(0));
    let counter = Arc::clone(&loads);
    let lazy = ComponentRef::lazy("Settings", move || {
        *counter.lock().unwrap() += 1;
        Arc::new("settings-view") as ComponentPayload
    });
    let routes = vec![RouteNode::new("/settings", lazy)];
    let router = RouterInstance::create(
        "lazy",
        &routes,
        RouterOptions::default().with_initial_path("/settings"),
    )
    .unwrap();

    let component = router.route().component_at(0).cloned().unwrap();
    assert!(component.is_lazy());
    assert!(!component.is_loaded());
    component.load();
    router.route().component_at(0).unwrap().load();
    assert_eq!(*loads.lock().unwrap(), 1);
}

#[test]
fn test_add_route_then_resolve() {
    let c = components();
    let router = RouterInstance::create(
        "grow",
        &scenario(&c),
        RouterOptions::default().with_initial_path("/bar/new"),
    )
    .unwrap();
    assert!(!router.route().is_matched());

    router
        .add_child_route(&RouteId::new("/bar", 0), RouteNode::new("new", ComponentRef::named("New")))
        .unwrap();
    assert_eq!(router.route().component_names(), vec!["Bar", "New"]);
}

#[test]
fn test_cache_disabled_still_resolves() {
    let c = components();
    let runtime = RuntimeConfig {
        render_cache: false,
        ..RuntimeConfig::default()
    };
    let router =
        RouterInstance::create_with_runtime("nocache", &scenario(&c), RouterOptions::default(), &runtime)
            .unwrap();
    router.replace("/bar").unwrap();
    let first = router.route().render_list.clone();
    router.replace("/bar?x").unwrap();
    let second = router.route().render_list.clone();
    assert_eq!(first[..], second[..]);
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn test_malformed_tree_is_rejected_whole() {
    let routes = vec![
        RouteNode::new("/ok", ComponentRef::named("Ok")),
        RouteNode {
            path: "/broken".into(),
            ..RouteNode::default()
        },
    ];
    let err = RouterInstance::create("bad", &routes, RouterOptions::default()).unwrap_err();
    assert_eq!(
        err.to_string(),
        "[vrouter] [register] malformed route at \"/broken\": missing component"
    );
}

#[test]
fn test_duplicate_registration_is_rejected() {
    let c = components();
    let router = RouterInstance::create("dup", &scenario(&c), RouterOptions::default()).unwrap();
    let err = router
        .add_route(RouteNode::new("/bar", ComponentRef::named("Bar2")))
        .unwrap_err();
    assert_eq!(
        err,
        RouterError::DuplicateRoute {
            full_path: "/bar".into(),
            depth: 0
        }
    );
    router.replace("/bar").unwrap();
    assert_eq!(router.route().component_names(), vec!["Bar", "Baz"]);
}
