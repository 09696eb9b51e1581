//! Store, resolution and binding scenarios.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use atomwind_style::prelude::*;
use serde_json::{Value, json};

fn store_with(atoms: Value) -> Arc<AtomStore> {
    store_with_config(StoreConfig::default(), atoms)
}

fn store_with_config(config: StoreConfig, atoms: Value) -> Arc<AtomStore> {
    let store = Arc::new(AtomStore::with_config(config));
    store.replace(serde_json::from_value(atoms).unwrap());
    store
}

fn styles(style: &ResolvedStyle) -> Value {
    serde_json::to_value(style.styles()).unwrap()
}

fn counter(store: &AtomStore, topics: impl IntoIterator<Item = Topic>) -> Arc<AtomicUsize> {
    let count = Arc::new(AtomicUsize::new(0));
    let count_clone = count.clone();
    store.subscribe(topics, move |_| {
        count_clone.fetch_add(1, Ordering::SeqCst);
    });
    count
}

#[test]
fn use_sync_is_stable() {
    let store = store_with(json!({
        "text-black": { "styles": [{ "color": "black" }] },
        "font-400": { "styles": [{ "fontWeight": "400" }] }
    }));
    let mut binding = StyleBinding::new(store);

    let first = binding.use_sync("text-black font-400", &LocalConditions::new());
    let second = binding.use_sync("text-black font-400", &LocalConditions::new());

    assert_eq!(first.child_class_names(), None);
    assert_eq!(styles(&first), json!([{ "color": "black" }, { "fontWeight": "400" }]));
    assert!(Arc::ptr_eq(first.styles_arc(), second.styles_arc()));
}

#[test]
fn styles_change_when_atoms_change() {
    let store = store_with(json!({
        "text-custom": { "styles": [{ "color": "custom" }] }
    }));
    let mut binding = StyleBinding::new(store.clone());
    let first = binding.use_sync("text-custom", &LocalConditions::new());
    assert_eq!(styles(&first), json!([{ "color": "custom" }]));

    store.replace(
        serde_json::from_value(json!({
            "text-custom": { "styles": [{ "color": "custom2" }] }
        }))
        .unwrap(),
    );
    assert!(binding.is_dirty());

    let second = binding.use_sync("text-custom", &LocalConditions::new());
    assert!(!first.same_as(&second));
    assert_eq!(second.child_class_names(), None);
    assert_eq!(styles(&second), json!([{ "color": "custom2" }]));
}

#[test]
fn color_scheme_toggle_notifies_once_per_transition() {
    let store = store_with(json!({
        "dark:text-custom": {
            "styles": [{ "color": "custom" }],
            "atRules": { "0": [[["prefers-color-scheme", "dark"]]] },
            "topics": ["color-scheme"]
        }
    }));
    let notifications = counter(&store, [Topic::ColorScheme]);
    let mut binding = StyleBinding::new(store.clone());

    assert_eq!(styles(&binding.use_sync("dark:text-custom", &LocalConditions::new())), json!([]));

    store.set_color_scheme(Some(ColorScheme::Dark));
    assert_eq!(notifications.load(Ordering::SeqCst), 1);
    assert_eq!(
        styles(&binding.use_sync("dark:text-custom", &LocalConditions::new())),
        json!([{ "color": "custom" }])
    );

    store.set_color_scheme(None);
    assert_eq!(notifications.load(Ordering::SeqCst), 2);
    assert_eq!(styles(&binding.use_sync("dark:text-custom", &LocalConditions::new())), json!([]));

    store.set_color_scheme(Some(ColorScheme::Dark));
    assert_eq!(store.toggle_color_scheme(), ColorScheme::Light);
    assert_eq!(notifications.load(Ordering::SeqCst), 4);
    assert_eq!(styles(&binding.use_sync("dark:text-custom", &LocalConditions::new())), json!([]));
}

#[test]
fn container_follows_width() {
    let store = store_with_config(
        StoreConfig::default().with_dimensions(700.0, 1.0),
        json!({
            "text-custom": { "styles": [{ "color": "custom" }] },
            "container": {
                "styles": [{ "width": "100%" }, { "maxWidth": 640 }, { "maxWidth": 760 }],
                "atRules": {
                    "1": [[["min-width", 640]]],
                    "2": [[["min-width", 768]]]
                },
                "topics": ["device-width"]
            }
        }),
    );
    let mut binding = StyleBinding::new(store.clone());

    let narrow = binding.use_sync("text-custom container", &LocalConditions::new());
    assert_eq!(narrow.child_class_names(), None);
    assert_eq!(
        styles(&narrow),
        json!([{ "color": "custom" }, { "width": "100%" }, { "maxWidth": 640 }])
    );

    store.set_dimensions(Dimensions::new(800.0, 1.0));
    let wide = binding.use_sync("text-custom container", &LocalConditions::new());
    assert_eq!(
        styles(&wide),
        json!([{ "color": "custom" }, { "width": "100%" }, { "maxWidth": 640 }, { "maxWidth": 760 }])
    );

    store.set_dimensions(Dimensions::new(600.0, 1.0));
    let narrower = binding.use_sync("text-custom container", &LocalConditions::new());
    assert_eq!(styles(&narrower), json!([{ "color": "custom" }, { "width": "100%" }]));
}

#[test]
fn hover_gates_styles() {
    let store = store_with(json!({
        "hover:text-custom": {
            "styles": [{ "color": "custom" }],
            "conditions": ["hover"]
        }
    }));
    let mut binding = StyleBinding::new(store);

    let idle = binding.use_sync("hover:text-custom", &LocalConditions::new());
    assert_eq!(idle.child_class_names(), None);
    assert_eq!(styles(&idle), json!([]));

    let hovered = binding.use_sync("hover:text-custom", &LocalConditions::new().with("hover"));
    assert_eq!(styles(&hovered), json!([{ "color": "custom" }]));
    assert_eq!(binding.resolve_count(), 2);
}

#[test]
fn gap_children_use_sibling_position() {
    let store = store_with(json!({
        "gap-x-2": {
            "styles": [{ "marginLeft": -8 }],
            "childClasses": ["gap-x-2:children"]
        },
        "gap-x-2:children": {
            "styles": [{ "marginLeft": 8 }],
            "conditions": ["not-first-child"]
        }
    }));

    let parent = StyleBinding::new(store.clone()).use_sync("gap-x-2", &LocalConditions::new());
    assert_eq!(parent.child_class_names(), Some(&["gap-x-2:children".to_string()][..]));
    assert_eq!(styles(&parent), json!([{ "marginLeft": -8 }]));

    let first_child =
        StyleBinding::new(store.clone()).use_sync("gap-x-2:children", &LocalConditions::new().nth_child(0));
    assert_eq!(first_child.child_class_names(), None);
    assert_eq!(styles(&first_child), json!([]));

    let second_child =
        StyleBinding::new(store).use_sync("gap-x-2:children", &LocalConditions::new().nth_child(1));
    assert_eq!(styles(&second_child), json!([{ "marginLeft": 8 }]));
}

// Conditions gate styles only. Child class names stay advertised while the
// parent's own conditions fail.
#[test]
fn child_classes_are_advertised_when_conditions_fail() {
    let child = "dark:hover:gap-x-2:children";
    let store = store_with(json!({
        "dark:hover:gap-x-2": {
            "styles": [{ "marginLeft": -8 }],
            "childClasses": [child],
            "conditions": ["hover"],
            "topics": ["color-scheme"],
            "atRules": { "0": [[["prefers-color-scheme", "dark"]]] }
        },
        child: {
            "styles": [{ "marginLeft": 8 }],
            "conditions": ["not-first-child"],
            "topics": ["color-scheme"],
            "atRules": { "0": [[["prefers-color-scheme", "dark"]]] }
        }
    }));
    let mut parent = StyleBinding::new(store.clone());
    let mut second_child = StyleBinding::new(store.clone());
    let position = LocalConditions::new().nth_child(1);

    let idle = parent.use_sync("dark:hover:gap-x-2", &LocalConditions::new());
    assert_eq!(idle.child_class_names(), Some(&[child.to_string()][..]));
    assert_eq!(styles(&idle), json!([]));
    assert_eq!(styles(&second_child.use_sync(child, &position)), json!([]));

    let hover = LocalConditions::new().with("hover");
    let hovered = parent.use_sync("dark:hover:gap-x-2", &hover);
    assert_eq!(hovered.child_class_names(), Some(&[child.to_string()][..]));
    assert_eq!(styles(&hovered), json!([]));

    store.set_color_scheme(Some(ColorScheme::Dark));
    assert!(parent.is_dirty());
    assert!(second_child.is_dirty());
    assert_eq!(styles(&parent.use_sync("dark:hover:gap-x-2", &hover)), json!([{ "marginLeft": -8 }]));
    assert_eq!(styles(&second_child.use_sync(child, &position)), json!([{ "marginLeft": 8 }]));
}

#[test]
fn unrelated_topics_do_not_recompute() {
    let store = store_with(json!({
        "dark:text-custom": {
            "styles": [{ "color": "custom" }],
            "atRules": { "0": [[["prefers-color-scheme", "dark"]]] },
            "topics": ["color-scheme"]
        }
    }));
    let renders = Arc::new(AtomicUsize::new(0));
    let renders_clone = renders.clone();
    let mut binding = StyleBinding::new(store.clone()).with_on_change(move || {
        renders_clone.fetch_add(1, Ordering::SeqCst);
    });
    let first = binding.use_sync("dark:text-custom", &LocalConditions::new());

    store.set_dimensions(Dimensions::new(1024.0, 768.0));
    store.set_variables([("--hue", 120)]);
    assert_eq!(renders.load(Ordering::SeqCst), 0);

    let second = binding.use_sync("dark:text-custom", &LocalConditions::new());
    assert_eq!(binding.resolve_count(), 1);
    assert!(first.same_as(&second));

    // The engine's own cache ignores the unrelated change as well.
    let direct = store.resolve(&["dark:text-custom"], &LocalConditions::new());
    assert!(first.same_as(&direct));
}

#[test]
fn platform_groups_or_and_predicates_and() {
    let store = store_with_config(
        StoreConfig::default().with_platform("android").with_dimensions(500.0, 900.0),
        json!({
            "shadow-sm": {
                "styles": [{ "elevation": 1.5 }],
                "atRules": { "0": [[["platform", "ios"]], [["platform", "android"]]] }
            },
            "android:sm:p-4": {
                "styles": [{ "padding": 16 }],
                "atRules": { "0": [[["platform", "android"], ["min-width", 640]]] },
                "topics": ["device-width"]
            }
        }),
    );

    let either = store.resolve(&["shadow-sm"], &LocalConditions::new());
    assert_eq!(styles(&either), json!([{ "elevation": 1.5 }]));

    let both = store.resolve(&["android:sm:p-4"], &LocalConditions::new());
    assert_eq!(styles(&both), json!([]));

    store.set_dimensions(Dimensions::new(700.0, 900.0));
    let both = store.resolve(&["android:sm:p-4"], &LocalConditions::new());
    assert_eq!(styles(&both), json!([{ "padding": 16 }]));
}

#[test]
fn variables_resolve_and_notify_dependents() {
    let store = Arc::new(AtomStore::new());
    store.replace(
        AtomRecord::from_css(
            ":root { --hue: 200; --accent: hsl(var(--hue), 50%, 50%); }
             .text-accent { color: var(--accent); }
             .text-fallback { color: var(--missing, red); }
             .text-stale { color: var(--missing); padding: 4px; }",
        )
        .unwrap(),
    );
    let hue = counter(&store, [Topic::variable("--hue")]);
    let accent = counter(&store, [Topic::variable("--accent")]);
    let mut binding = StyleBinding::new(store.clone());

    let before = binding.use_sync("text-accent", &LocalConditions::new());
    assert_eq!(styles(&before), json!([{ "color": "hsl(200, 50%, 50%)" }]));

    let changed = store.set_runtime_state(RuntimeStatePatch::new().variable("--hue", 120));
    assert!(changed.contains(&Topic::variable("--accent")));
    assert_eq!(hue.load(Ordering::SeqCst), 1);
    assert_eq!(accent.load(Ordering::SeqCst), 1);
    assert!(binding.is_dirty());

    let after = binding.use_sync("text-accent", &LocalConditions::new());
    assert_eq!(styles(&after), json!([{ "color": "hsl(120, 50%, 50%)" }]));

    let fallback = store.resolve(&["text-fallback", "text-stale"], &LocalConditions::new());
    assert_eq!(styles(&fallback), json!([{ "color": "red" }, { "padding": 4 }]));
}

#[test]
fn variables_inside_multi_part_values() {
    let store = Arc::new(AtomStore::new());
    store.replace(
        AtomRecord::from_css(
            ":root { --o: 0.5; }
             .shadow-tint { box-shadow: 0 0 0 var(--o); color: rgb(255 255 255 / var(--o)); }
             .shadow { --shadow-opacity: 0.1; shadow-opacity: var(--shadow-opacity); }
             .shadow-strong { --shadow-opacity: 0.9; }",
        )
        .unwrap(),
    );
    let mut binding = StyleBinding::new(store.clone());

    let tint = binding.use_sync("shadow-tint", &LocalConditions::new());
    assert_eq!(
        styles(&tint),
        json!([{ "boxShadow": "0 0 0 0.5", "color": "rgb(255 255 255 / 0.5)" }])
    );
    assert!(tint.topics().contains(&Topic::variable("--o")));

    store.set_variables([("--o", 0.25)]);
    assert!(binding.is_dirty());
    let tint = binding.use_sync("shadow-tint", &LocalConditions::new());
    assert_eq!(
        styles(&tint),
        json!([{ "boxShadow": "0 0 0 0.25", "color": "rgb(255 255 255 / 0.25)" }])
    );

    let plain = store.resolve(&["shadow"], &LocalConditions::new());
    assert_eq!(styles(&plain), json!([{ "shadowOpacity": 0.1 }]));
    let strong = store.resolve(&["shadow", "shadow-strong"], &LocalConditions::new());
    assert_eq!(styles(&strong), json!([{ "shadowOpacity": 0.9 }]));
}

#[test]
fn branching_variable_chains_resolve() {
    let mut css = String::from(":root { --v0: 4;");
    for i in 1..=24 {
        css.push_str(&format!(" --v{i}: max(var(--v{0}), var(--v{0}));", i - 1));
    }
    css.push_str(" --x: max(var(--x), var(--x)); }");
    css.push_str(" .w { width: var(--v24); } .loop { width: var(--x, 2); }");

    let store = Arc::new(AtomStore::new());
    store.replace(AtomRecord::from_css(&css).unwrap());

    let first = store.resolve(&["w"], &LocalConditions::new());
    assert_eq!(styles(&first), json!([{ "width": 4 }]));
    let again = store.resolve(&["w"], &LocalConditions::new());
    assert!(first.same_as(&again));

    let cyclic = store.resolve(&["loop"], &LocalConditions::new());
    assert_eq!(styles(&cyclic), json!([{ "width": 2 }]));
}

#[test]
fn reset_clears_everything() {
    let store = store_with_config(
        StoreConfig::default().with_dimensions(320.0, 640.0),
        json!({ "text-black": { "styles": [{ "color": "black" }] } }),
    );
    let notifications = counter(&store, []);
    store.set_dimensions(Dimensions::new(1024.0, 768.0));
    store.set_variables([("--hue", 120)]);
    let mut binding = StyleBinding::new(store.clone());
    assert_eq!(styles(&binding.use_sync("text-black", &LocalConditions::new())), json!([{ "color": "black" }]));

    store.reset();

    assert_eq!(notifications.load(Ordering::SeqCst), 1);
    assert_eq!(store.subscriber_count(), 0);
    let state = store.runtime_state();
    assert_eq!(state.dimensions, Dimensions::new(320.0, 640.0));
    assert!(state.variables.is_empty());
    assert_eq!(styles(&binding.use_sync("text-black", &LocalConditions::new())), json!([]));
}
