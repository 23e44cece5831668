use template_chips_engine::{
    AttributeValue, Attributes, CaretGuard, Document, EditorSession, ReconcilerOptions, Seed,
    TextRun, project,
};

fn session() -> EditorSession {
    EditorSession::new(ReconcilerOptions {
        caret_guard: CaretGuard::TrailingMarker,
        tail_reserve: 1,
        ..ReconcilerOptions::default()
    })
    .unwrap()
}

fn mounted(seed: Seed) -> EditorSession {
    let mut session = session();
    session.mount(seed).unwrap();
    session
}

#[test]
fn projection_of_inline_seed() {
    let session = mounted(Seed::PlainText("Hello {{user}} ".to_string()));
    insta::assert_snapshot!(session.projection(), @"Hello {{user}} ");
}

#[test]
fn projection_of_html_seed() {
    let session = mounted(Seed::Html(
        "<h1>Invoice for {{ Customer Name }}</h1>\
         <p>Dear <strong>{{first}}</strong>,</p>\
         <p><br></p>\
         <blockquote>Due <em>{{due_date}}</em></blockquote>"
            .to_string(),
    ));

    insta::assert_snapshot!(
        session.projection(),
        @"<h1>Invoice for {{ Customer Name }}</h1><p>Dear {{first}},</p><p><br/></p><blockquote>Due {{due_date}}</blockquote>"
    );
}

#[test]
fn surface_of_html_seed() {
    let mut session = mounted(Seed::Html("<p>Dear {{first}},</p>".to_string()));
    session.select_all();

    let copied = session.copy().unwrap();
    insta::assert_snapshot!(
        copied.html,
        @r#"<p>Dear <span class="dynamic-variable" data-marker="{{first}}" data-title="first" contenteditable="false">first</span>,</p>"#
    );
}

#[test]
fn projection_after_typing() {
    let mut session = mounted(Seed::PlainText("Hi ".to_string()));
    session.type_text("{{Test Variable 3}}").unwrap();
    session.type_text("!").unwrap();

    insta::assert_snapshot!(session.projection(), @"Hi {{TestVariable3}}! ");
}

#[test]
fn projection_of_delta_seed() {
    let json = r#"{"ops":[
        {"insert":"Total: "},
        {"insert":{"TemplateMarker":{"marker":"{{amount}}","title":"amount"}}},
        {"insert":" {{currency}}","attributes":{"bold":true}},
        {"insert":"\n"}
    ]}"#;
    let session = mounted(Seed::Delta(Document::from_json(json).unwrap()));

    insta::assert_snapshot!(session.projection(), @"<p>Total: {{amount}}<strong> </strong>{{currency}}</p>");
}

#[test]
fn projection_escapes_text_but_not_markers() {
    let doc = Document::from_runs(vec![
        TextRun::plain("a < b & {{x}}").into(),
        TextRun::styled(
            "link",
            Attributes::from([(
                "link".to_string(),
                AttributeValue::Text("https://example.com/?q=1&r=2".to_string()),
            )]),
        )
        .into(),
    ]);
    let doc = template_chips_engine::transform(&doc);

    insta::assert_snapshot!(
        project(&doc),
        @r#"a &lt; b &amp; {{x}}<a href="https://example.com/?q=1&amp;r=2" target="_blank">link</a>"#
    );
}
