use pdf_outline::candidates::extract_candidates;
use pdf_outline::{classify, load_document, stats, OutlineOptions};
use std::env;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: debug-lines <pdf_path> [max_page | min-max]");
        std::process::exit(1);
    }

    let range = args.get(2).map(|s| s.as_str()).unwrap_or("1-3");
    let (min_page, max_page): (u32, u32) = if let Some((a, b)) = range.split_once('-') {
        (a.parse().unwrap_or(1), b.parse().unwrap_or(3))
    } else {
        (1, range.parse().unwrap_or(3))
    };

    let doc = match load_document(&args[1]) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let options = OutlineOptions::default();
    let stats = stats::analyze(&doc, &options);
    println!(
        "pages={} body_size={} body_font={:?} title={:?}",
        doc.page_count(),
        stats.body_size,
        stats.body_font,
        doc.title
    );

    let candidates = extract_candidates(&doc, &options);
    for page in min_page..=max_page {
        let page_lines: Vec<_> = candidates.iter().filter(|c| c.page == page).collect();
        println!("=== PAGE {} ({} candidates) ===", page, page_lines.len());
        for line in &page_lines {
            let level = classify(line, &stats, &options)
                .map(|l| l.to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  {:>2} top={:7.1} bottom={:7.1} size={:3} bold={:5} text={:?}",
                level, line.bbox.top, line.bbox.bottom, line.size, line.bold, line.text
            );
        }
        println!();
    }
}
