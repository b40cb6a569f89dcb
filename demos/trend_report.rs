use anyhow::{bail, Context};
use financial_trend_analyser::*;

fn main() -> anyhow::Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let selection = match args.iter().position(|a| a == "--year") {
        Some(idx) if idx + 1 < args.len() => {
            let year = args.remove(idx + 1);
            args.remove(idx);
            YearSelection::parse(&year)
        }
        Some(_) => bail!("--year needs a value such as 2021 or \"All year\""),
        None => YearSelection::All,
    };

    if args.is_empty() {
        bail!("usage: trend_report [--year YEAR] <statement.csv> [Competitive_analysis.csv] [demograph.csv]");
    }

    let workbook = workbook_from_csv_paths(&args).context("failed to read CSV sheets")?;
    println!("📂 Loaded {} sheet(s): {:?}\n", workbook.len(), workbook.sheet_names());

    if let Some(first) = workbook.first_sheet() {
        let options: Vec<String> = YearFilter::selection_options(first)
            .iter()
            .map(ToString::to_string)
            .collect();
        println!("📅 Year options: {}\n", options.join(", "));
    }

    let analyser = TrendAnalyser::new(AnalyserConfig::quarterly_results_layout())?;
    let analysis = analyser.analyze_workbook(&workbook, &selection);

    if let Some(statement) = &analysis.statement {
        println!("📊 Metrics for {}:", selection);
        println!("{}\n", serde_json::to_string_pretty(&statement.metrics)?);

        println!("📈 Charts:");
        println!("{}\n", serde_json::to_string_pretty(&statement.charts)?);

        println!("📝 Summary prompt:");
        println!("{}\n", statement.prompt.render());
    }

    if let Some(competitive) = &analysis.competitive {
        println!("🏁 Competitive series: {}", competitive.series.len());
        println!("{}\n", competitive.prompt);
    }

    if let Some(demographic) = &analysis.demographic {
        for series in &demographic.series {
            println!("🥧 {} (total {})", series.name, series.total());
        }
        println!();
    }

    for failure in &analysis.failures {
        eprintln!(
            "❌ {} failed for '{}': {}",
            failure.operation, failure.sheet, failure.message
        );
    }

    Ok(())
}
