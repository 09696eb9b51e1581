//! CSS → AtomRecord extraction scenarios.

use atomwind_style::atom::AtomRecord;
use serde_json::{Value, json};

fn extract(css: &str) -> Value {
    let record = AtomRecord::from_css(css).unwrap();
    serde_json::to_value(&record).unwrap()
}

#[test]
fn root_variables() {
    let output = extract(
        ":root {
            --number: 255;
            --string: string;
            --unit: 123vw;
            --rgb: rgb(255, 255, 255);
            --default-value: var(--value, 2);
            --rgb-var: rgb(255, 255, var(--number));
            --inline-theme-value: var(--error-color,platformColor(ios__systemRed,android__colorError,default__red));
            font-size: 16;
            padding: 1px;
        }
        .text-white { color: #fff; }",
    );

    assert_eq!(
        output,
        json!({
            ":root": {
                "variables": {
                    "--number": 255,
                    "--string": "string",
                    "--unit": { "function": "vw", "values": [123] },
                    "--rgb": "rgb(255, 255, 255)",
                    "--default-value": { "function": "var", "values": ["--value", 2] },
                    "--rgb-var": {
                        "function": "inbuilt",
                        "values": ["rgb", 255, 255, { "function": "var", "values": ["--number"] }]
                    },
                    "--inline-theme-value": {
                        "function": "var",
                        "values": [
                            "--error-color",
                            {
                                "function": "platformColor",
                                "values": ["ios__systemRed", "android__colorError", "default__red"]
                            }
                        ]
                    },
                    "--rem": 16
                }
            },
            "text-white": {
                "styles": [{ "color": "#fff" }]
            }
        })
    );
}

#[test]
fn media_query_appends_gated_fragment() {
    let output = extract(
        ".text-media-query { color: black; }
         @media (prefers-color-scheme: dark) {
             .text-media-query { color: white; }
         }",
    );

    assert_eq!(
        output,
        json!({
            "text-media-query": {
                "styles": [{ "color": "black" }, { "color": "white" }],
                "atRules": { "1": [[["prefers-color-scheme", "dark"]]] },
                "topics": ["color-scheme"]
            }
        })
    );
}

#[test]
fn gap_builds_child_atom() {
    let output = extract(
        ".gap-2 { margin-left: -8px; margin-top: -8px; }
         .gap-2 > * { margin-left: 8px; margin-top: 8px; }",
    );

    assert_eq!(
        output,
        json!({
            "gap-2": {
                "styles": [{ "marginLeft": -8, "marginTop": -8 }],
                "childClasses": ["gap-2:children"]
            },
            "gap-2:children": {
                "styles": [{ "marginLeft": 8, "marginTop": 8 }]
            }
        })
    );
}

#[test]
fn variable_references_become_topics() {
    let output = extract(
        ":root { --hue: 255; }
         .text-hue { color: hsl(var(--hue), var(--saturation), var(--lightness)); }",
    );

    assert_eq!(
        output,
        json!({
            ":root": { "variables": { "--hue": 255 } },
            "text-hue": {
                "styles": [{
                    "color": {
                        "function": "inbuilt",
                        "values": [
                            "hsl",
                            { "function": "var", "values": ["--hue"] },
                            { "function": "var", "values": ["--saturation"] },
                            { "function": "var", "values": ["--lightness"] }
                        ]
                    }
                }],
                "topics": ["--hue", "--lightness", "--saturation"]
            }
        })
    );
}

#[test]
fn dark_and_hover_variants() {
    let output = extract(
        r"@media (prefers-color-scheme: dark) { .dark\:text-red-500 { color: #ef4444; } }
          .hover\:text-red-500:hover { color: #ef4444; }",
    );

    assert_eq!(
        output,
        json!({
            "dark:text-red-500": {
                "styles": [{ "color": "#ef4444" }],
                "atRules": { "0": [[["prefers-color-scheme", "dark"]]] },
                "topics": ["color-scheme"]
            },
            "hover:text-red-500": {
                "styles": [{ "color": "#ef4444" }],
                "conditions": ["hover"]
            }
        })
    );
}

#[test]
fn platform_media_types() {
    let output = extract(
        "@media android { .shadow-sm { elevation: 1.5; shadow-color: black; } }
         @media ios { .shadow-sm { shadow-radius: 2px; shadow-color: rgba(0, 0, 0, 0.1); } }",
    );

    assert_eq!(
        output,
        json!({
            "shadow-sm": {
                "styles": [
                    { "elevation": 1.5, "shadowColor": "black" },
                    { "shadowRadius": 2, "shadowColor": "rgba(0, 0, 0, 0.1)" }
                ],
                "atRules": {
                    "0": [[["platform", "android"]]],
                    "1": [[["platform", "ios"]]]
                }
            }
        })
    );
}

#[test]
fn container_breakpoints() {
    let output = extract(
        ".container { width: 100%; }
         @media (min-width: 640px) { .container { max-width: 640px; } }
         @media (min-width: 768px) { .container { max-width: 768px; } }
         @media (min-width: 1024px) { .container { max-width: 1024px; } }
         @media (min-width: 1280px) { .container { max-width: 1280px; } }
         @media (min-width: 1536px) { .container { max-width: 1536px; } }",
    );

    assert_eq!(
        output,
        json!({
            "container": {
                "styles": [
                    { "width": "100%" },
                    { "maxWidth": 640 },
                    { "maxWidth": 768 },
                    { "maxWidth": 1024 },
                    { "maxWidth": 1280 },
                    { "maxWidth": 1536 }
                ],
                "atRules": {
                    "1": [[["min-width", 640]]],
                    "2": [[["min-width", 768]]],
                    "3": [[["min-width", 1024]]],
                    "4": [[["min-width", 1280]]],
                    "5": [[["min-width", 1536]]]
                },
                "topics": ["device-width"]
            }
        })
    );
}

#[test]
fn framework_directives_and_bad_rules_are_skipped() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();

    let output = extract(
        "@tailwind utilities;
         @font-face { font-family: Inter; }
         .broken { color: ; }
         div .descendant { color: red; }
         .text-black { color: black; margin: !important; }",
    );

    assert_eq!(
        output,
        json!({
            "text-black": { "styles": [{ "color": "black" }] }
        })
    );
}

#[test]
fn extracted_records_survive_serialization() {
    let record = AtomRecord::from_css(
        ".gap-2 { margin-left: -8px; }
         .gap-2 > * + * { margin-left: 8px; }
         @media ios, android { .p-safe { padding: max(8px, 2vw); } }",
    )
    .unwrap();

    let json = record.to_json_pretty().unwrap();
    assert_eq!(AtomRecord::from_json(&json).unwrap(), record);
}
