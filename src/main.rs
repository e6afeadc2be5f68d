use anyhow::Result;
use crossterm::{
    ExecutableCommand,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use sheetdash::{
    cli::{Args, Command},
    loader::{LoadMode, Pipeline},
    logging, relay,
    state::App,
    view::{self, ViewState},
};
use std::{io::stdout, sync::Arc};

const TITLE: &str = "Form Responses";

#[tokio::main]
async fn main() -> Result<()> {
    let args = <Args as clap::Parser>::parse();
    let command = match args.command() {
        Ok(v) => v,
        Err(e) => {
            eprintln!("\n{}", e);
            std::process::exit(1);
        }
    };

    match command {
        Command::Relay(addr) => {
            logging::init_stderr();
            relay::start(addr, args.source()?)?.await?;
            Ok(())
        }
        Command::Dump => {
            logging::init_stderr();
            dump(&args).await
        }
        Command::Dashboard => dashboard(&args).await,
    }
}

/// Load once and print what the dashboard would show, as JSON.
async fn dump(args: &Args) -> Result<()> {
    let pipeline = Pipeline::new(args.source()?, args.policy()?)?;
    let table = match pipeline.run_cycle().await {
        Ok(table) => table,
        Err(e) => {
            eprintln!("Failed to load data: {e}");
            std::process::exit(1);
        }
    };
    let page = args.paginate().then(|| args.page.unwrap_or(1));
    let visible = view::apply(
        &table.rows,
        args.search.as_deref().unwrap_or(""),
        &args.sort_config(),
        page,
    );
    println!("{}", serde_json::to_string_pretty(&visible)?);
    Ok(())
}

async fn dashboard(args: &Args) -> Result<()> {
    logging::init_file(&args.log_file)?;
    let mode = match args.poll_interval()? {
        Some(period) => LoadMode::Polling(period),
        None => LoadMode::Once,
    };
    let pipeline = Arc::new(Pipeline::new(args.source()?, args.policy()?)?);
    let mut app = App::start(
        TITLE,
        pipeline,
        mode,
        ViewState::new(args.sort_config(), args.paginate()),
    );

    // --- setup terminal
    let mut out = stdout();
    out.execute(EnterAlternateScreen)?;
    enable_raw_mode()?;
    let mut term = Terminal::new(CrosstermBackend::new(out))?;
    term.clear()?;

    let res = app.run(&mut term);

    // restore terminal
    disable_raw_mode()?;
    let backend = term.backend_mut();
    backend.execute(LeaveAlternateScreen)?;
    term.show_cursor()?;

    res
}
