use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use hansnap::clipboard::{create_backend, PixelImage};
use hansnap::config::{ensure_directories, Config, ConfigStorage, TomlConfigStorage};
use hansnap::logging::init_logger;
use hansnap::monitor::{ClipboardProcessor, DirectoryMonitor};
use hansnap::ocr::{TesseractCli, TextRecognizer};
use hansnap::store::{MemoryStore, TranslationStore};
use hansnap::translate::{HttpTranslateClient, TranslateClient};

#[derive(Parser)]
#[command(name = "hansnap")]
#[command(about = "Clipboard monitor with OCR and Chinese translation", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Monitor the clipboard continuously (daemon mode)
    Monitor,

    /// Process the current clipboard contents once and exit
    Once,

    /// Print the resolved configuration
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Monitor) | None => cmd_monitor(),
        Some(Commands::Once) => cmd_once(),
        Some(Commands::Config) => cmd_config(),
    }
}

/// Per-run pipeline state shared by the text and image callbacks
struct Pipeline {
    recognizer: Option<TesseractCli>,
    client: Option<HttpTranslateClient>,
    store: MemoryStore,
}

impl Pipeline {
    fn from_config(config: &Config) -> Self {
        let recognizer = if config.ocr.enabled {
            match TesseractCli::new(&config.ocr.language) {
                Ok(r) => Some(r),
                Err(e) => {
                    log::warn!("OCR disabled: {:#}", e);
                    None
                }
            }
        } else {
            None
        };

        let client = if config.backend.url.is_empty() {
            None
        } else {
            match HttpTranslateClient::with_timeout(
                &config.backend.url,
                Duration::from_secs(config.backend.timeout_secs),
            ) {
                Ok(c) => Some(c),
                Err(e) => {
                    log::warn!("Translation disabled: {:#}", e);
                    None
                }
            }
        };

        Pipeline {
            recognizer,
            client,
            store: MemoryStore::new(),
        }
    }

    fn handle_text(&mut self, text: &str, timestamp: DateTime<Utc>) {
        println!("[{}] text: {}", timestamp.format("%H:%M:%S"), text);

        // Repeated copies of the same text skip the backend round-trip
        if let Some(record) = self.store.lookup(text) {
            log::debug!("Translation cache hit");
            print_translation(&record.translation);
            return;
        }

        let Some(client) = &self.client else {
            return;
        };

        match client.translate(text) {
            Ok(translation) => {
                print_translation(&translation);
                let audio_id = translation.audio_id.clone();
                if let Err(e) = self.store.store(text, &translation, audio_id.as_deref()) {
                    log::warn!("Failed to store translation: {:#}", e);
                }
            }
            Err(e) => {
                log::error!("Translation failed: {}", e);
            }
        }
    }

    fn handle_image(&mut self, image: &PixelImage, timestamp: DateTime<Utc>) {
        println!(
            "[{}] image: {} x {}",
            timestamp.format("%H:%M:%S"),
            image.width,
            image.height
        );

        let Some(recognizer) = &self.recognizer else {
            return;
        };

        let text = recognizer.recognize(image);
        if text.is_empty() {
            log::info!("No text recognized in image");
            return;
        }

        // Recognized text flows through the same path as copied text
        self.handle_text(&text, timestamp);
    }
}

fn print_translation(translation: &hansnap::translate::Translation) {
    println!("  english:   {}", translation.meaning_english);
    println!("  pinyin:    {}", translation.pinyin_mandarin);
    println!("  jyutping:  {}", translation.jyutping_cantonese);
    println!("  cantonese: {}", translation.equivalent_cantonese);
    if let Some(audio_id) = &translation.audio_id {
        println!("  audio:     {}", audio_id);
    }
}

fn load_config() -> Result<(Config, std::path::PathBuf)> {
    let (data_dir, config_dir) = ensure_directories()?;
    let storage = TomlConfigStorage::new(config_dir.join("hansnap.toml"));
    let config = storage.load()?;
    Ok((config, data_dir))
}

fn build_processor(pipeline: Arc<Mutex<Pipeline>>) -> Result<ClipboardProcessor> {
    let backend = create_backend().context("Failed to open system clipboard")?;
    let mut processor = ClipboardProcessor::new(backend);

    let text_pipeline = Arc::clone(&pipeline);
    let image_pipeline = pipeline;

    processor.initialize(
        Some(Box::new(move |text, timestamp| {
            if let Ok(mut p) = text_pipeline.lock() {
                p.handle_text(text, timestamp);
            }
        })),
        Some(Box::new(move |image, timestamp| {
            if let Ok(mut p) = image_pipeline.lock() {
                p.handle_image(image, timestamp);
            }
        })),
    );

    Ok(processor)
}

/// Monitor the clipboard until killed
fn cmd_monitor() -> Result<()> {
    let (config, data_dir) = load_config()?;

    // Warnings and errors come back through the status channel so they
    // reach the terminal as well as the log file
    let (status_tx, status_rx) = mpsc::channel();
    init_logger(
        data_dir.join("hansnap.log"),
        Some(status_tx),
        &config.general.log_level,
        "warn",
    )?;

    log::info!("Starting clipboard monitor");

    let pipeline = Arc::new(Mutex::new(Pipeline::from_config(&config)));
    let mut processor = build_processor(pipeline)?;

    let interval = Duration::from_millis(config.general.poll_interval_ms);
    if !processor.start(interval) {
        anyhow::bail!("Failed to start clipboard monitoring");
    }

    println!(
        "Monitoring clipboard every {} ms. Press Ctrl-C to stop.",
        config.general.poll_interval_ms
    );

    // Optional directory watch alongside the clipboard poll
    let mut dir_monitor = DirectoryMonitor::new();
    if let Some(watch_dir) = &config.general.watch_dir {
        if let Err(e) = dir_monitor.init(watch_dir) {
            log::warn!("Directory watch unavailable: {:#}", e);
        } else {
            println!("Watching directory {:?}", watch_dir);
        }
    }

    loop {
        while let Ok(status) = status_rx.try_recv() {
            let tag = if status.is_error() { "error" } else { "warning" };
            eprintln!("{}: {}", tag, status.message);
        }

        while let Some(change) = dir_monitor.try_next() {
            log::info!("File changed: {:?}", change.path);
            println!("file changed: {}", change.path.display());
        }

        if !processor.is_running() {
            log::info!("Clipboard monitor stopped");
            break;
        }

        thread::sleep(Duration::from_millis(200));
    }

    Ok(())
}

/// Process the current clipboard contents once
fn cmd_once() -> Result<()> {
    env_logger::init();

    let (config, _data_dir) = load_config()?;

    let pipeline = Arc::new(Mutex::new(Pipeline::from_config(&config)));
    let processor = build_processor(pipeline)?;

    match processor.poll_once() {
        Some(event) => println!(
            "(change captured at {})",
            event.timestamp().format("%Y-%m-%d %H:%M:%S")
        ),
        None => println!("(clipboard empty or unchanged)"),
    }

    Ok(())
}

/// Print the resolved configuration
fn cmd_config() -> Result<()> {
    env_logger::init();

    let (config, data_dir) = load_config()?;

    println!("# Resolved configuration (data dir: {:?})", data_dir);
    print!("{}", toml::to_string_pretty(&config)?);

    Ok(())
}
