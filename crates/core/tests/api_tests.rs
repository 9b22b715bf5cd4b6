//! Library API integration tests
use precis_core::*;
use rstest::rstest;

fn get_fixture_path(name: &str) -> String {
    format!("../../tests/fixtures/{}", name)
}

fn load_fixture(name: &str) -> Document {
    let html = std::fs::read_to_string(get_fixture_path(name)).unwrap();
    Document::parse(&html)
}

fn scenario_rules() -> IgnoreRules {
    IgnoreRules::new(DEFAULT_IGNORE_TAGS.iter().copied(), [".ad-banner"])
}

#[test]
fn test_scenario_page() {
    let doc = load_fixture("scenario.html");
    assert_eq!(extract_document(&doc, &scenario_rules()), "Title Main content paragraph.");
}

#[test]
fn test_hidden_sibling_excluded() {
    let doc = Document::parse(r#"<body><p style="display:none">Hidden</p><p>Visible</p></body>"#);
    let text = extract_document(&doc, &IgnoreRules::default());
    assert!(text.contains("Visible"));
    assert!(!text.contains("Hidden"));
}

#[test]
fn test_empty_body() {
    let doc = load_fixture("empty_body.html");
    assert_eq!(extract_document(&doc, &IgnoreRules::default()), "");
}

#[test]
fn test_bad_selector_changes_nothing() {
    let doc = load_fixture("scenario.html");
    let with_bad = scenario_rules().with_selector(":::bad-selector");
    assert_eq!(extract_document(&doc, &with_bad), extract_document(&doc, &scenario_rules()));
}

#[test]
fn test_article_fixture() {
    let doc = load_fixture("article.html");
    let rules = IgnoreRules::default().with_selector(".cookie-banner").with_selector("aside.related");

    assert_eq!(
        extract_document(&doc, &rules),
        "Tidepools at Low Tide Anemones close when the water retreats. \
         Hermit crabs trade shells in the shallows. Open panel text. Sea stars Limpets Species Count"
    );
}

#[test]
fn test_article_fixture_default_rules_keep_aside() {
    let doc = load_fixture("article.html");
    let text = extract_document(&doc, &IgnoreRules::default());

    assert!(text.contains("Related posts"));
    assert!(text.contains("We use cookies."));
    assert!(!text.contains("Field Notes"));
    assert!(!text.contains("Collapsed panel text."));
    assert!(!text.contains("Printed on recycled paper."));
    assert!(!text.contains("skip link"));
    assert!(!text.contains("analytics"));
}

#[rstest]
#[case::display_none(r#"<div style="display:none"><p>secret</p></div>"#)]
#[case::visibility_hidden(r#"<div style="visibility:hidden"><p>secret</p></div>"#)]
#[case::visibility_collapse(r#"<table><tr style="visibility:collapse"><td>secret</td></tr></table>"#)]
#[case::opacity_zero(r#"<div style="opacity:0"><p>secret</p></div>"#)]
#[case::hidden_attribute(r#"<div hidden><p>secret</p></div>"#)]
#[case::sheet_rule(r#"<style>.x { display: none }</style><div class="x"><p>secret</p></div>"#)]
#[case::template(r#"<template><p>secret</p></template>"#)]
#[case::closed_dialog(r#"<dialog><p>secret</p></dialog>"#)]
#[case::ruby_parenthesis(r#"<ruby><rp>secret</rp></ruby>"#)]
#[case::noembed(r#"<noembed>secret</noembed>"#)]
#[case::noframes(r#"<noframes>secret</noframes>"#)]
#[case::image_map_area(r#"<map name="m"><area alt="secret" href="/a"></map>"#)]
#[case::object_param(r#"<object><param name="secret" value="secret"></object>"#)]
fn test_hidden_content_never_extracted(#[case] fragment: &str) {
    let html = format!("<html><body><p>shown</p>{fragment}</body></html>");
    let doc = Document::parse(&html);
    assert_eq!(extract_document(&doc, &IgnoreRules::none()), "shown");
}

#[test]
fn test_open_dialog_is_extracted() {
    let doc = Document::parse("<body><p>shown</p><dialog open><p>Subscribe?</p></dialog></body>");
    assert_eq!(extract_document(&doc, &IgnoreRules::none()), "shown Subscribe?");
}

#[rstest]
#[case::by_tag("<aside><p>secret <b>deep</b></p></aside>", IgnoreRules::none().with_tag("aside"))]
#[case::by_class("<div class='promo'><p>secret</p></div>", IgnoreRules::none().with_selector(".promo"))]
#[case::by_id("<div id='comments'><p>secret</p></div>", IgnoreRules::none().with_selector("#comments"))]
#[case::by_attribute("<div data-role='ad'>secret</div>", IgnoreRules::none().with_selector("[data-role=ad]"))]
#[case::by_descendant("<main><div><span>secret</span></div></main>", IgnoreRules::none().with_selector("main span"))]
fn test_ignored_content_never_extracted(#[case] fragment: &str, #[case] rules: IgnoreRules) {
    let html = format!("<body><p>shown</p>{fragment}</body>");
    let doc = Document::parse(&html);
    assert_eq!(extract_document(&doc, &rules), "shown");
}

#[rstest]
#[case("<body>  lots \n\n of \t space  </body>")]
#[case("<body><p> a </p>\n<p>\n b</p><br><br><div> </div>c</body>")]
#[case("<body>&nbsp;x&nbsp;&nbsp;y&nbsp;</body>")]
#[case("<body></body>")]
fn test_result_is_normalized(#[case] html: &str) {
    let text = extract_document(&Document::parse(html), &IgnoreRules::default());

    assert_eq!(text, text.trim());
    assert!(!text.chars().zip(text.chars().skip(1)).any(|(a, b)| a.is_whitespace() && b.is_whitespace()));
    assert_eq!(collapse_whitespace(&text), text);
}

#[test]
fn test_extraction_leaves_tree_untouched() {
    let doc = load_fixture("article.html");
    let before = doc.html().html();
    let _ = extract_document(&doc, &IgnoreRules::default().with_selector("p"));
    assert_eq!(doc.html().html(), before);
}

#[test]
fn test_extract_from_subtree_root() {
    let doc = load_fixture("article.html");
    let article = doc.select("article").unwrap().into_iter().next();
    let text = extract_text(article, &IgnoreRules::default());
    assert!(text.starts_with("Tidepools at Low Tide"));
    assert!(!text.contains("Related posts"));
}

#[test]
fn test_subtree_root_inherits_hidden_ancestor() {
    let doc = Document::parse("<body><div style='visibility:hidden'><p id='x'>secret</p></div></body>");
    let p = doc.select("#x").unwrap().into_iter().next();
    assert_eq!(extract_text(p, &IgnoreRules::none()), "");
}

#[test]
fn test_page_capture_with_settings_rules() {
    let doc = load_fixture("scenario.html");
    let mut settings = Settings::default();
    settings.set("ignore-selectors", ".ad-banner").unwrap();

    let captured = capture(
        CaptureSource::Page { document: &doc, url: Some("https://example.com/post".to_string()) },
        &settings.ignore_rules(),
    );

    assert_eq!(captured.extracted_text, "Title Main content paragraph.");
    assert_eq!(captured.source_url.as_deref(), Some("https://example.com/post"));
    assert_eq!(captured.source_title, None);
}

#[test]
fn test_settings_store_and_prompt_flow() {
    let tmp = tempfile::TempDir::new().unwrap();
    let store = SettingsStore::new(tmp.path().join("settings.json"));

    let mut settings = store.load().unwrap();
    let id = settings.prompts.add("Brief", "Summarize in one paragraph.").unwrap().id.clone();
    settings.prompts.set_default(&id).unwrap();
    store.save(&settings).unwrap();

    let reloaded = store.load().unwrap();
    let prompt = reloaded.prompts.resolve(None).unwrap();
    assert_eq!(prompt.title, "Brief");
    assert_eq!(reloaded.prompts.auto_run_prompt().map(|p| p.id.as_str()), Some(id.as_str()));
}
