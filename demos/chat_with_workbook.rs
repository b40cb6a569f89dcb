use dotenv::dotenv;
use financial_trend_analyser::llm::{AzureOpenAiClient, AzureOpenAiSettings};
use financial_trend_analyser::*;
use std::error::Error;
use std::io::{self, Write};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn Error>> {
    dotenv().ok();

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        return Err("usage: chat_with_workbook <statement.csv> [more sheets...]".into());
    }

    let workbook = workbook_from_csv_paths(&paths)?;
    let analyser = TrendAnalyser::new(AnalyserConfig::quarterly_results_layout())?;
    let client = AzureOpenAiClient::new(AzureOpenAiSettings::from_env()?);

    let analysis = analyser.analyze_workbook(&workbook, &YearSelection::All);
    if let Some(statement) = &analysis.statement {
        println!("📝 Generating summary...\n");
        let summary = summarize(&client, &statement.prompt).await?;
        for section in report_sections(&summary) {
            if section.heading.is_empty() {
                println!("{}\n", section.body);
            } else {
                println!("## {}\n{}\n", section.heading, section.body);
            }
        }
    }

    let context = analyser.chat_context(&workbook, &YearSelection::All)?;
    let mut conversation = Conversation::new();

    println!("🤖 Ready! Ask questions about the workbook (type 'quit' to exit).");
    println!("------------------------------------------------------------------");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        let question = input.trim();

        if question.eq_ignore_ascii_case("quit") || question.eq_ignore_ascii_case("exit") {
            break;
        }

        if question.is_empty() {
            continue;
        }

        match conversation.ask(&client, &context, question).await {
            Ok(answer) => {
                println!("\n{}\n", answer);
                println!("------------------------------------------------------------------");
            }
            Err(e) => {
                eprintln!("❌ Error: {}", e);
            }
        }
    }

    Ok(())
}
