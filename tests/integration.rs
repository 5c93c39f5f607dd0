//! Integration tests for the auto-linking engine.

use std::collections::BTreeSet;

use pretty_assertions::assert_eq;
use regex::Regex;
use wiki_autolink::{
    Candidate, ExceptionRule, Linker, TocEntry, default_rules, extract_toc, find_matches,
    process_content_with_links, resolve_overlaps,
};

fn link(html: &str, terms: &[Candidate], docs: &[Candidate], current: &str) -> String {
    process_content_with_links(html, terms, docs, current, &default_rules())
}

/// Tag names and attribute names appearing in `html`.
fn structure(html: &str) -> BTreeSet<String> {
    let tag_re = Regex::new(r"<(/?[A-Za-z][A-Za-z0-9]*)([^>]*)>").unwrap();
    let attr_re = Regex::new(r#"([A-Za-z-]+)="[^"]*""#).unwrap();

    let mut names = BTreeSet::new();
    for caps in tag_re.captures_iter(html) {
        names.insert(format!("tag:{}", &caps[1]));
        for attr in attr_re.captures_iter(&caps[2]) {
            names.insert(format!("attr:{}", &attr[1]));
        }
    }
    names
}

fn strip_generated(html: &str) -> String {
    let link_re =
        Regex::new(r#"<span class="(?:term|doc)-link" data-(?:term|doc)="[^"]*">(.*?)</span>"#)
            .unwrap();
    link_re.replace_all(html, "$1").into_owned()
}

#[test]
fn test_pod_scenario() {
    let out = link(
        "<p>Kubernetes runs Pod objects.</p>",
        &[Candidate::term("t1", "Pod")],
        &[],
        "",
    );
    assert_eq!(
        out,
        r#"<p>Kubernetes runs <span class="term-link" data-term="t1">Pod</span> objects.</p>"#
    );
}

#[test]
fn test_heading_stays_unlinked() {
    let html = "<h2>Pod Lifecycle</h2>";
    assert_eq!(link(html, &[Candidate::term("t1", "Pod")], &[], ""), html);
}

#[test]
fn test_longest_match_wins() {
    let terms = vec![
        Candidate::term("api", "API"),
        Candidate::term("gw", "API Gateway"),
    ];
    let out = link("<p>The API Gateway routes traffic.</p>", &terms, &[], "");
    assert_eq!(
        out,
        r#"<p>The <span class="term-link" data-term="gw">API Gateway</span> routes traffic.</p>"#
    );
}

#[test]
fn test_longest_match_across_kinds_of_candidates() {
    // A shorter term is linked first; the longer document title then no
    // longer appears as plain text.
    let out = link(
        "<p>See API Gateway.</p>",
        &[Candidate::term("api", "API")],
        &[Candidate::document("gw", "API Gateway")],
        "",
    );
    assert_eq!(
        out,
        r#"<p>See <span class="term-link" data-term="api">API</span> Gateway.</p>"#
    );
}

#[test]
fn test_self_reference_suppression() {
    let docs = vec![Candidate::document("foo", "Foo")];
    assert_eq!(
        link("<p>Foo here</p>", &[], &docs, "Foo"),
        "<p>Foo here</p>"
    );

    let rules = vec![ExceptionRule::self_reference().with_enabled(false)];
    let out = process_content_with_links("<p>Foo here</p>", &[], &docs, "Foo", &rules);
    assert_eq!(
        out,
        r#"<p><span class="doc-link" data-doc="foo">Foo</span> here</p>"#
    );
}

#[test]
fn test_escape_marker_respected() {
    let terms = vec![Candidate::term("t1", "用語")];
    assert_eq!(link("<p>##用語##</p>", &terms, &[], ""), "<p>##用語##</p>");
}

#[test]
fn test_kanji_adjacency_rule() {
    let terms = vec![Candidate::term("t1", "データ")];
    let html = "<p>顧客データ管理と、データの扱い</p>";

    let out = link(html, &terms, &[], "");
    assert_eq!(
        out,
        concat!(
            "<p>顧客データ管理と、",
            r#"<span class="term-link" data-term="t1">データ</span>の扱い</p>"#
        )
    );

    let rules = vec![ExceptionRule::script_adjacency().with_enabled(false)];
    let out = process_content_with_links(html, &terms, &[], "", &rules);
    assert_eq!(out.matches("term-link").count(), 2);
}

#[test]
fn test_custom_rule_and_invalid_pattern() {
    let terms = vec![Candidate::term("v", "v2"), Candidate::term("pod", "Pod")];
    let rules = vec![
        ExceptionRule::custom("(", ""),
        ExceptionRule::custom(r"^v\d$", "g"),
    ];
    let out = process_content_with_links("<p>Pod v2</p>", &terms, &[], "", &rules);
    assert_eq!(
        out,
        r#"<p><span class="term-link" data-term="pod">Pod</span> v2</p>"#
    );
}

#[test]
fn test_equal_length_same_position_first_candidate_wins() {
    let terms = vec![Candidate::term("first", "Node"), Candidate::term("second", "Node")];
    let out = link("<p>Node</p>", &terms, &[], "");
    assert_eq!(
        out,
        r#"<p><span class="term-link" data-term="first">Node</span></p>"#
    );
}

#[test]
fn test_toc_scenario() {
    let toc = extract_toc(r#"<h1>Intro</h1><h2 id="x">Details</h2>"#);
    assert_eq!(
        toc,
        vec![
            TocEntry {
                id: "intro".to_string(),
                text: "Intro".to_string(),
                level: 1
            },
            TocEntry {
                id: "x".to_string(),
                text: "Details".to_string(),
                level: 2
            },
        ]
    );
}

#[test]
fn test_toc_unchanged_by_linking() {
    let html = concat!(
        r#"<h1 id="pods">Pods and Nodes</h1>"#,
        "<p>A Pod runs on a Node.</p>",
        "<h2>Pod Lifecycle</h2>",
        r#"<p>See <a href="node.html" title="Node">the Node page</a>.</p>"#,
        "<h3>ノードの管理</h3>",
    );
    let terms = vec![Candidate::term("pod", "Pod"), Candidate::term("node", "Node")];
    let docs = vec![Candidate::document("lifecycle", "Pod Lifecycle")];

    let linked = link(html, &terms, &docs, "");
    assert_eq!(extract_toc(&linked), extract_toc(html));
}

#[test]
fn test_structure_preserved() {
    let html = concat!(
        r#"<h2 id="api">API Gateway</h2>"#,
        r#"<p class="API" data-note="API Gateway">Call the API Gateway &amp; API.</p>"#,
        r#"<ul><li><a href="/api" title="API">API docs</a></li></ul>"#,
        r#"<pre><code class="language-api">API call</code></pre>"#,
        r#"<img src="api.png" alt="API Gateway diagram">"#,
    );
    let terms = vec![
        Candidate::term("api", "API"),
        Candidate::term("gw", "API Gateway"),
        Candidate::term("amp", "amp"),
        Candidate::term("class", "class"),
    ];
    let docs = vec![Candidate::document("data", "data"), Candidate::document("docs", "docs")];

    let linked = link(html, &terms, &docs, "");

    let mut expected = structure(html);
    expected.insert("tag:span".to_string());
    expected.insert("tag:/span".to_string());
    expected.insert("attr:data-term".to_string());
    expected.insert("attr:data-doc".to_string());
    expected.insert("attr:class".to_string());
    assert_eq!(structure(&linked), expected);

    // Removing the generated wrappers gives the input back
    assert_eq!(strip_generated(&linked), html);
}

#[test]
fn test_doc_links_layer_on_term_links() {
    let out = link(
        "<p>Deploy a Pod with the Setup Guide.</p>",
        &[Candidate::term("pod", "Pod")],
        &[Candidate::document("guide/setup", "Setup Guide")],
        "",
    );
    assert_eq!(
        out,
        concat!(
            r#"<p>Deploy a <span class="term-link" data-term="pod">Pod</span> with the "#,
            r#"<span class="doc-link" data-doc="guide/setup">Setup Guide</span>.</p>"#
        )
    );
}

#[test]
fn test_private_use_glyph_does_not_stop_linking() {
    let out = link(
        "<p>\u{E000} icon then Pod here</p><p>Pod</p>",
        &[Candidate::term("t1", "Pod")],
        &[],
        "",
    );
    assert_eq!(
        out,
        concat!(
            "<p>\u{E000} icon then <span class=\"term-link\" data-term=\"t1\">Pod</span> here</p>",
            "<p><span class=\"term-link\" data-term=\"t1\">Pod</span></p>"
        )
    );
}

#[test]
fn test_linker_is_reusable() {
    let linker = Linker::new(&default_rules());
    let terms = vec![Candidate::term("pod", "Pod")];
    let first = linker.process("<p>Pod</p>", &terms, &[], "");
    let second = linker.process("<p>Pod</p>", &terms, &[], "");
    assert_eq!(first, second);
}

#[test]
fn test_empty_inputs() {
    assert_eq!(link("", &[], &[], ""), "");
    assert_eq!(link("<p>text</p>", &[], &[], ""), "<p>text</p>");
    assert!(extract_toc("<p>text</p>").is_empty());
}

#[test]
fn test_matcher_and_resolver_public_api() {
    let api = Candidate::term("api", "API");
    let gateway = Candidate::term("gw", "API Gateway");
    let resolved = resolve_overlaps(find_matches("API Gateway and API", [&api, &gateway]));
    let found: Vec<(usize, &str)> = resolved.iter().map(|m| (m.start(), m.text())).collect();
    assert_eq!(found, vec![(0, "API Gateway"), (16, "API")]);
}
