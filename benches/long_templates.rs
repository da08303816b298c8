use criterion::{criterion_group, criterion_main, Criterion};

use tmplscript::{parse, Dialect, LexerOptions, ParserOptions};

fn synthetic_template(sections: usize) -> String {
    let mut out = String::new();
    for i in 0..sections {
        out.push_str("Some raw text before section ");
        out.push_str(&i.to_string());
        out.push_str(".\n{{ if items[");
        out.push_str(&i.to_string());
        out.push_str("] != null }}\n  {{ for item in items }}\n    {{ item.name | upper }}\n  {{ end }}\n{{ else }}\n  nothing here\n{{ end }}\n");
    }
    out
}

fn long_templates(c: &mut Criterion) {
    let content = synthetic_template(200);
    let mut group = c.benchmark_group("long templates");
    group.bench_function("default dialect", |b| {
        b.iter(|| {
            let (page, _) = parse(&content, LexerOptions::default(), ParserOptions::default());
            page
        })
    });
    group.finish();
}

fn long_liquid_templates(c: &mut Criterion) {
    let mut content = String::new();
    for i in 0..200 {
        content.push_str("Row ");
        content.push_str(&i.to_string());
        content.push_str("\n{% if row %}\n  {% for item in row.items %}{{ item }}{% endfor %}\n{% else %}\n  empty\n{% endif %}\n");
    }
    let options = LexerOptions {
        dialect: Dialect::Liquid,
        ..LexerOptions::default()
    };
    let mut group = c.benchmark_group("long templates");
    group.bench_function("liquid dialect", |b| {
        b.iter(|| {
            let (page, _) = parse(&content, options.clone(), ParserOptions::default());
            page
        })
    });
    group.finish();
}

criterion_group!(benches, long_templates, long_liquid_templates);
criterion_main!(benches);
