use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use editor_surface::{
    FindHighlight, OverviewRuler, SelectedWordState, StyledTextBuffer, SystemClock, TagMatcher,
    TextBuffer, ViewSettings, auto_insert,
};
use editor_surface_lang::LexerKind;

fn large_text(line_count: usize) -> String {
    let mut out = String::with_capacity(line_count * 64);
    for i in 0..line_count {
        out.push_str(&format!(
            "{i:06} the quick brown fox jumps over the lazy dog (editor-surface benchmark line)\n"
        ));
    }
    out.pop();
    out
}

fn large_xml(element_count: usize) -> String {
    let mut out = String::from("<root>\n");
    for i in 0..element_count {
        out.push_str(&format!(
            "  <item id=\"{i}\" note=\"a > b\">\n    <name>n{i}</name>\n  </item>\n"
        ));
    }
    out.push_str("</root>\n");
    out
}

fn bench_selected_word_enumeration(c: &mut Criterion) {
    let text = large_text(50_000);
    let clock = SystemClock::new();
    c.bench_function("selected_word/50k_lines", |b| {
        b.iter_batched(
            || {
                let mut buffer = TextBuffer::new(&text);
                // "fox" on the first line.
                buffer.set_sel(Some(23), 26);
                buffer
            },
            |mut buffer| {
                let mut state = SelectedWordState::new();
                let mut overview = OverviewRuler::new();
                state.mark(
                    &mut buffer,
                    &mut overview,
                    &FindHighlight::default(),
                    &clock,
                    false,
                    false,
                );
                black_box(state.marker_count());
            },
            BatchSize::LargeInput,
        )
    });
}

fn bench_tag_matching_far_close(c: &mut Criterion) {
    let mut buffer = TextBuffer::new(&large_xml(10_000));
    buffer.set_lexer_kind(LexerKind::Xml);
    let matcher = TagMatcher::default();
    c.bench_function("tag_match/root_of_10k_elements", |b| {
        b.iter(|| {
            let tags = matcher.find_matched_tags_at(&buffer, black_box(2));
            black_box(tags);
        })
    });
}

fn bench_tag_highlight_in_middle(c: &mut Criterion) {
    let mut buffer = TextBuffer::new(&large_xml(10_000));
    buffer.set_lexer_kind(LexerKind::Xml);
    let middle = buffer.position_from_line(buffer.line_count() / 2);
    let caret = middle + buffer.text_range(middle, middle + 8).find('<').unwrap_or(0) + 1;
    buffer.set_sel(None, caret);
    let matcher = TagMatcher::default();
    c.bench_function("tag_match/highlight_middle", |b| {
        b.iter(|| black_box(matcher.highlight(&mut buffer)))
    });
}

fn bench_auto_brace_typing(c: &mut Criterion) {
    let text = large_text(50_000);
    let settings = ViewSettings::default();
    c.bench_function("auto_brace/100_pairs_middle", |b| {
        b.iter_batched(
            || {
                let mut buffer = TextBuffer::new(&text);
                buffer.set_lexer_kind(LexerKind::Cpp);
                let middle = buffer.len() / 2;
                buffer.set_sel(None, middle);
                buffer
            },
            |mut buffer| {
                for _ in 0..100 {
                    auto_insert::auto_braces(&mut buffer, '{', &settings);
                }
                black_box(buffer.len());
            },
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(
    benches,
    bench_selected_word_enumeration,
    bench_tag_matching_far_close,
    bench_tag_highlight_in_middle,
    bench_auto_brace_typing
);
criterion_main!(benches);
