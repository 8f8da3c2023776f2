//! # chathtml CLI
//!
//! Command-line interface for the chathtml library.

use std::process;
use std::time::Instant;

use clap::Parser as ClapParser;

use chathtml::ChatHtmlError;
use chathtml::attachment::FfmpegTranscoder;
use chathtml::batch::{load_jobs, process_chats};
use chathtml::cli::{Args, BatchArgs, Command, RenderArgs};
use chathtml::config::Templates;
use chathtml::logging;
use chathtml::render::{RenderStats, render_chat};

fn main() {
    if let Err(e) = run() {
        eprintln!("❌ Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), ChatHtmlError> {
    let args = <Args as ClapParser>::parse();
    logging::init(logging::level_for_verbosity(args.verbose));

    println!("💬 chathtml v{}", env!("CARGO_PKG_VERSION"));
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let transcoder = args.transcoder();
    if !transcoder.is_available() {
        println!(
            "⚠️  {} not found, voice notes that need transcoding will fail",
            args.ffmpeg.display()
        );
    }

    match &args.command {
        Command::Render(render) => run_render(render, &transcoder),
        Command::Batch(batch) => run_batch(batch, &transcoder),
    }
}

fn run_render(args: &RenderArgs, transcoder: &FfmpegTranscoder) -> Result<(), ChatHtmlError> {
    let start = Instant::now();
    let ctx = args.context();
    let options = args.options();
    let templates = Templates::load(args.header.as_deref(), args.footer.as_deref())?;
    let html_path = options.html_path(&ctx);

    println!("👤 Recipient: {}", ctx.recipient_name);
    println!("📂 Input:     {}", ctx.source_dir.display());
    println!("💾 Output:    {}", html_path.display());
    if options.group_chat {
        println!("👥 Mode:      Group chat");
    }
    println!();

    println!("⏳ Rendering...");
    let stats = render_chat(&ctx, &options, &templates, transcoder)?;

    println!();
    println!("✅ Done! Output saved to {}", html_path.display());
    print_summary(&stats);
    println!();
    println!("⚡ Total time: {:.2}s", start.elapsed().as_secs_f64());

    Ok(())
}

fn run_batch(args: &BatchArgs, transcoder: &FfmpegTranscoder) -> Result<(), ChatHtmlError> {
    let start = Instant::now();
    let config = args.config();
    let raw = load_jobs(&args.jobs)?;

    println!("📋 Jobs:    {} ({})", raw.len(), args.jobs.display());
    println!("🧵 Workers: {}", config.workers);
    println!();

    let report = process_chats(raw, &config, transcoder);

    for job in &report.completed {
        println!("✅ #{} {} → {}", job.index, job.recipient, job.html_path.display());
    }
    for job in &report.failed {
        println!("❌ #{} {}: {}", job.index, job.recipient, job.error);
    }
    for job in &report.rejected {
        println!("🚫 #{} rejected: {}", job.index, job.reason);
    }

    print_summary(&report.total_stats());
    println!(
        "   Chats:        {} completed, {} failed, {} rejected",
        report.completed.len(),
        report.failed.len(),
        report.rejected.len()
    );
    println!();
    println!("⚡ Total time: {:.2}s", start.elapsed().as_secs_f64());

    report.ensure_success()
}

fn print_summary(stats: &RenderStats) {
    println!();
    println!("📊 Summary:");
    println!("   Messages:     {}", stats.messages);
    println!(
        "   Attachments:  {} copied, {} transcoded, {} unsupported",
        stats.attachments_copied, stats.attachments_transcoded, stats.attachments_unresolved
    );
    if stats.notices > 0 {
        println!("   Notices:      {}", stats.notices);
    }
    if stats.remnants > 0 {
        println!("   Loose lines:  {}", stats.remnants);
    }
}
