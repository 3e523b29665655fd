//! Literal fixture suite: input fragment to expected runs

use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;

use htmltext_content::{
    render, render_with_options, RenderOptions, StyleFlags, StyledRun, DEFAULT_MAX_INPUT_BYTES,
};
use htmltext_parser::sanitize_html;

const NONE: StyleFlags = StyleFlags::NONE;
const BOLD: StyleFlags = StyleFlags::BOLD;
const ITALIC: StyleFlags = StyleFlags::ITALIC;
const UNDERLINE: StyleFlags = StyleFlags::UNDERLINE;
const STRIKE: StyleFlags = StyleFlags::STRIKETHROUGH;

fn t(text: &str, flags: StyleFlags) -> StyledRun {
    StyledRun::text(text, flags)
}

fn para() -> StyledRun {
    StyledRun::paragraph_break()
}

fn line() -> StyledRun {
    StyledRun::line_break()
}

fn fixtures() -> Vec<(&'static str, Vec<StyledRun>)> {
    vec![
        ("", vec![]),
        ("plain text", vec![t("plain text", NONE)]),
        ("<strong>Bold</strong>", vec![t("Bold", BOLD)]),
        ("<em>Italic</em>", vec![t("Italic", ITALIC)]),
        ("<u>u</u><ins>i</ins>", vec![t("ui", UNDERLINE)]),
        ("<s>a</s><strike>b</strike><del>c</del>", vec![t("abc", STRIKE)]),
        ("<p>Hello &amp; welcome</p>", vec![t("Hello & welcome", NONE), para()]),
        ("<p>Safe<script>alert(1)</script></p>", vec![t("Safe", NONE), para()]),
        (
            "<b>bold<i>both</b>more</i>",
            vec![t("bold", BOLD), t("both", BOLD | ITALIC), t("more", NONE)],
        ),
        ("</div>", vec![]),
        ("a</div>b", vec![t("ab", NONE)]),
        ("<h1>Title</h1>body", vec![t("Title", BOLD), para(), t("body", NONE)]),
        ("one<br>two", vec![t("one", NONE), line(), t("two", NONE)]),
        ("one<br/>two", vec![t("one", NONE), line(), t("two", NONE)]),
        (
            "<ol><li>x</li><li>y</li></ol>",
            vec![t("x", NONE), line(), t("y", NONE), line()],
        ),
        (
            "<blockquote><p>q</p></blockquote>after",
            vec![t("q", NONE), para(), t("after", NONE)],
        ),
        ("<span>un</span><font>wrapped</font>", vec![t("unwrapped", NONE)]),
        ("<b onclick=\"x()\" style=\"color:red\">b</b>", vec![t("b", BOLD)]),
        ("<style>p { color: red }</style>text", vec![t("text", NONE)]),
        ("<!-- hidden -->shown", vec![t("shown", NONE)]),
        ("a &lt;b&gt; c", vec![t("a <b> c", NONE)]),
        ("&unknown; &#65;&#x42;", vec![t("&unknown; AB", NONE)]),
        ("<b><b>nested</b></b>", vec![t("nested", BOLD)]),
        ("x < y", vec![t("x < y", NONE)]),
        (
            "<a href=\"https://example.com\">link</a>",
            vec![StyledRun::link("link", UNDERLINE, "https://example.com")],
        ),
        ("<a href=\"javascript:alert(1)\">link</a>", vec![t("link", UNDERLINE)]),
        (
            "<a href=\"jav&#x61;script:alert(1)\">link</a>",
            vec![t("link", UNDERLINE)],
        ),
        ("<p></p><p></p>", vec![]),
    ]
}

#[test]
fn test_fixtures() {
    for (html, expected) in fixtures() {
        let actual = render(Some(html)).into_runs();
        assert_eq!(actual, expected, "input: {html:?}");
    }
}

#[test]
fn test_none_equals_empty() {
    assert_eq!(render(None), render(Some("")));
    assert!(render(None).is_empty());
}

#[test]
fn test_script_body_never_surfaces() {
    let inputs = [
        "<script>alert(1)</script>",
        "<SCRIPT>alert(1)</SCRIPT>",
        "<script/>alert(1)</script>",
        "<script>alert(1)",
        "<div><script>alert(1)</script></div>",
        "<noscript>alert(1)</noscript>",
        "<svg><script>alert(1)</script></svg>",
        "<iframe>alert(1)</iframe>",
    ];
    for html in inputs {
        let text = render(Some(html));
        assert!(!text.plain_text().contains("alert"), "input: {html:?}");
    }
}

#[test]
fn test_script_at_depth_cap() {
    let html = format!("{}<script>alert(1)</script>", "<div>".repeat(150));
    assert!(!render(Some(html.as_str())).plain_text().contains("alert"));
}

#[test]
fn test_idempotent_over_sanitized_html() {
    let inputs = [
        "<p>Hello &amp; welcome</p>",
        "<b>bold<i>both</b>more</i>",
        "<div onclick=\"x\"><span>a</span><br>b<ul><li>c</li></ul></div>",
        "<a href=\"https://a.test/?q=1&amp;r=2\" title=\"t\">x</a> & <y>",
        "<p>Safe<script>alert(1)</script></p>",
    ];
    for html in inputs {
        let once = sanitize_html(html);
        assert_eq!(sanitize_html(&once), once, "input: {html:?}");
        assert_eq!(render(Some(once.as_str())), render(Some(html)), "input: {html:?}");
    }
}

#[test]
fn test_pathological_depth() {
    let html = format!("{}deep{}", "<b>".repeat(100_000), "</b>".repeat(100_000));
    assert_eq!(render(Some(html.as_str())).into_runs(), vec![t("deep", BOLD)]);

    let html = "<div>".repeat(100_000);
    assert!(render(Some(html.as_str())).is_empty());
}

#[test]
fn test_unterminated_markup_at_input_cap() {
    for unit in ["<a ", "</a", "<!x"] {
        let html = unit.repeat(DEFAULT_MAX_INPUT_BYTES / unit.len());
        let started = Instant::now();
        let text = render(Some(html.as_str()));
        assert!(started.elapsed() < Duration::from_secs(10), "unit: {unit:?}");
        assert_eq!(text.into_runs(), vec![t(&html, NONE)], "unit: {unit:?}");
    }
}

#[test]
fn test_content_dropping_tags_at_depth_cap() {
    let html = format!(
        "{}<template>secret</template><select><option>opt</option></select><svg><text>svg</text></svg>",
        "<div>".repeat(100)
    );
    assert!(render(Some(html.as_str())).is_empty());

    let html = format!("{}<template>secret</template>shown", "<div>".repeat(100));
    assert_eq!(render(Some(html.as_str())).into_runs(), vec![t("shown", NONE), line()]);
}

#[test]
fn test_suppressed_tags_survive_raw_text_above_cap() {
    let options = RenderOptions::default().with_max_depth(2);
    let text = render_with_options(Some("<b><i><b>x<script></script>y</b>z</i>w</b>"), &options);
    assert_eq!(text.into_runs(), vec![t("xyz", BOLD | ITALIC), t("w", BOLD)]);
}

#[test]
fn test_collapse_whitespace_option() {
    let options = RenderOptions::default().with_collapse_whitespace(true);
    let text = render_with_options(Some("<p>  a \n\t b  </p>\n<p>c</p>"), &options);
    assert_eq!(text.plain_text(), "a b\n\nc\n\n");
}

#[test]
fn test_linearized_spans() {
    let linear = render(Some("<b>A</b>\u{1F600}<i>z</i>")).linearize();
    assert_eq!(linear.text, "A\u{1F600}z");
    let ranges: Vec<_> = linear.spans.iter().map(|span| (span.start, span.end)).collect();
    assert_eq!(ranges, vec![(0, 1), (1, 3), (3, 4)]);
}
