// valentine - terminal front-end for the Valentine's proposal journey

use anyhow::Context;
use clap::Parser;
use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use termimad::MadSkin;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use valentine::config::{CONFIG_FILE, ValentineConfig};
use valentine::journey::{ActionOutcome, JourneyController, Screen, Session};
use valentine::share::{CommandShareTarget, DownloadFallback, NoNativeShare, ShareOutcome, ShareTarget, Sharer};
use valentine::{ApiKey, EncodedImage, GeminiClient, MediaEncoder};

#[derive(Parser, Debug)]
#[command(author, version, about = "An interactive Valentine's proposal, drawn by AI", long_about = None)]
struct Args {
    /// Config file (default: ./valentine.toml, then the user config directory)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory where generated images are saved as they arrive
    #[arg(short, long, default_value = "valentine-output")]
    output: PathBuf,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Write an example valentine.toml and exit
    #[arg(long)]
    init: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("valentine={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if args.init {
        return write_example_config(Path::new(CONFIG_FILE));
    }

    let config = ValentineConfig::load(args.config.as_deref())?;
    let api_key = ApiKey::from_env()?;

    let generator = GeminiClient::new(config.gemini.clone(), api_key)?;
    tracing::info!("Using model: {}", config.gemini.model);

    let mut controller = JourneyController::new(Arc::new(generator), config.catalog.catalogs()?);
    if let Some(path) = &config.journey.fallback_partner_photo {
        let photo = MediaEncoder::new()
            .encode_file(path)
            .await
            .with_context(|| format!("Failed to load fallback partner photo {}", path.display()))?;
        controller = controller.with_fallback_partner_photo(photo);
    }

    let target: Box<dyn ShareTarget> =
        match CommandShareTarget::from_command(&config.share.command, std::env::temp_dir()) {
            Some(target) => Box::new(target),
            None => Box::new(NoNativeShare),
        };
    let sharer = Sharer::new(
        target,
        DownloadFallback::new(config.share.download_dir()),
        config.share.title.clone(),
        config.share.text.clone(),
    );

    let mut renderer = Renderer::new(args.output.clone());
    renderer.show(&controller.snapshot()).await?;

    let mut updates = Box::pin(controller.updates());
    let render_task = tokio::spawn(async move {
        while let Some(session) = updates.next().await {
            if let Err(e) = renderer.show(&session).await {
                tracing::warn!("Render error: {}", e);
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "quit" | "exit" | "q") {
            break;
        }
        handle_command(&controller, &sharer, line).await;
    }

    drop(controller);
    if let Err(e) = render_task.await {
        tracing::warn!("Render task ended abnormally: {}", e);
    }
    println!("Goodbye ❤️");

    Ok(())
}

async fn handle_command(controller: &JourneyController, sharer: &Sharer, line: &str) {
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    let outcome = match command {
        "start" => controller.start(),
        "name" => controller.set_user_name(rest),
        "flower" => match rest {
            "prev" | "previous" => controller.previous_flower(),
            _ => controller.next_flower(),
        },
        "color" => match rest {
            "prev" | "previous" => controller.previous_color(),
            _ => controller.next_color(),
        },
        "create" => controller.generate_flower().await,
        "continue" => controller.continue_to_bouquet().await,
        "retry" => controller.retry(),
        "final" => controller.proceed(),
        "yes" => controller.accept(),
        "photo" => controller.attach_user_photo(expand_home(rest)).await,
        "partner" => controller.attach_partner_photo(expand_home(rest)).await,
        "clear" => match rest {
            "partner" => controller.clear_partner_photo(),
            _ => controller.clear_user_photo(),
        },
        "comic" => controller.generate_comic().await,
        "ok" | "dismiss" => controller.dismiss_notice(),
        "restart" => controller.restart(),
        "share" => {
            match controller.share_comic(sharer).await {
                Ok(ShareOutcome::Downloaded(path)) => println!(
                    "Sharing isn't supported here, so the comic was saved to {} instead! ❤️",
                    path.display()
                ),
                Ok(ShareOutcome::NothingToShare) => println!("There's no comic to share yet."),
                Ok(_) => {}
                Err(e) => eprintln!("❌ Could not save the comic: {}", e),
            }
            return;
        }
        "help" => {
            print_usage();
            return;
        }
        _ => {
            eprintln!("Unknown command: {} (type 'help')", command);
            return;
        }
    };

    match outcome {
        ActionOutcome::Rejected(rejection) => eprintln!("⚠️  {}", rejection),
        ActionOutcome::Busy => eprintln!("⏳ Still working on the last request..."),
        _ => {}
    }
}

fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

/// Draws session snapshots and keeps generated images on disk
struct Renderer {
    skin: MadSkin,
    output_dir: PathBuf,
    saved: Vec<(&'static str, EncodedImage)>,
}

impl Renderer {
    fn new(output_dir: PathBuf) -> Self {
        Self {
            skin: MadSkin::default(),
            output_dir,
            saved: Vec::new(),
        }
    }

    async fn show(&mut self, session: &Session) -> anyhow::Result<()> {
        self.save_new_images(session).await?;

        let mut stdout = std::io::stdout();
        execute!(stdout, Clear(ClearType::All), MoveTo(0, 0))?;
        self.skin.print_text(&self.markdown(session));

        if let Some(notice) = &session.notice {
            println!(
                "[{}] 💔 {}  (type 'ok' to dismiss)",
                notice.raised_at.format("%H:%M:%S"),
                notice.message
            );
        }
        Ok(())
    }

    async fn save_new_images(&mut self, session: &Session) -> anyhow::Result<()> {
        let images = [
            ("flower", &session.flower_image),
            ("bouquet", &session.bouquet_image),
            ("comic", &session.comic_image),
        ];

        for (kind, image) in images {
            let Some(image) = image else { continue };
            if self.saved.iter().any(|(k, saved)| *k == kind && saved == image) {
                continue;
            }

            let path = self.output_dir.join(format!("{}.{}", kind, extension(image.mime_type())));
            tokio::fs::create_dir_all(&self.output_dir).await?;
            tokio::fs::write(&path, image.bytes()).await?;
            tracing::info!("Saved {} image to {}", kind, path.display());

            self.saved.retain(|(k, _)| *k != kind);
            self.saved.push((kind, image.clone()));
        }
        Ok(())
    }

    fn image_path(&self, kind: &str) -> Option<PathBuf> {
        self.saved
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(k, image)| self.output_dir.join(format!("{}.{}", k, extension(image.mime_type()))))
    }

    fn markdown(&self, session: &Session) -> String {
        let progress = session.screen.progress() as usize;
        let mut md = format!(
            "`{}{}` {}%\n\n",
            "█".repeat(progress / 5),
            "░".repeat(20 - progress / 5),
            progress
        );

        if session.is_generating {
            md.push_str(&format!(
                "# {}\n\n*Our AI artist is crafting something truly special. This creation might take a few moments...*\n",
                session.loading_message
            ));
            return md;
        }

        let body = match session.screen {
            Screen::Welcome => "# 💌 Valentine's Magic\n\n\
                *\"Every flower blooms in its own time, but my love for you blooms always.\"*\n\n\
                Type **start** to begin the journey."
                .to_string(),
            Screen::Journey => {
                let name = if session.has_name() {
                    session.user_name.clone()
                } else {
                    "*Please enter your name to continue*".to_string()
                };
                format!(
                    "# Customize Your Gift\n\n\
                    | | |\n|-|-|\n\
                    | **Name** | {} |\n\
                    | **Flower** | ‹ {} › |\n\
                    | **Color** | ‹ {} › |\n\n\
                    Commands: **name** *text*, **flower** next|prev, **color** next|prev, **create**",
                    name,
                    session.selected_flower(),
                    session.selected_color()
                )
            }
            Screen::FlowerResult => format!(
                "# A Gift for You\n\n*Something special, created just for you*\n\n🌸 {}\n\n\
                **continue** to carry on, or **retry** to try a different combination",
                self.describe("flower")
            ),
            Screen::BouquetResult => format!(
                "# A Special Delivery\n\n*A lush bouquet for my favorite person*\n\n💐 {}\n\n\
                Look closely! There's a card for you...\n\nType **final** for the final surprise 🎁",
                self.describe("bouquet")
            ),
            Screen::Final => format!(
                "# 💝 Will you be my Valentine?\n\n*{}, you make every day feel like spring.*\n\n\
                Type **yes**.",
                session.trimmed_name()
            ),
            Screen::UploadPicture => {
                let photo = |p: &Option<EncodedImage>| match p {
                    Some(image) => format!("✓ {} ({} bytes)", image.mime_type(), image.len()),
                    None => "none".to_string(),
                };
                let mut text = format!(
                    "# One Last Magic Moment...\n\n\
                    *\"I want to turn us into a story. Please upload a picture of yourself (or both of us!)\"*\n\n\
                    | | |\n|-|-|\n\
                    | **Your picture** | {} |\n\
                    | **Your favorite picture of him** | {} |\n\n\
                    Commands: **photo** *path*, **partner** *path*, **clear** photo|partner",
                    photo(&session.user_photo),
                    photo(&session.partner_photo)
                );
                if session.user_photo.is_some() {
                    text.push_str(", **comic** to generate our story ✨");
                }
                text
            }
            Screen::ComicResult => format!(
                "# Our dreamy Valentine's proposal\n\n*A comic strip of our love, drawn just for us.*\n\n📖 {}\n\n\
                **share** our story 🚀 or **restart** ❤️",
                self.describe("comic")
            ),
        };

        md.push_str(&body);
        md.push('\n');
        md
    }

    fn describe(&self, kind: &str) -> String {
        match self.image_path(kind) {
            Some(path) => format!("Saved to `{}`", path.display()),
            None => "(image not saved)".to_string(),
        }
    }
}

fn extension(mime_type: &str) -> &str {
    match mime_type {
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        _ => "png",
    }
}

fn write_example_config(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }

    let mut example = ValentineConfig::default();
    example.share.command = vec!["xdg-open".to_string()];
    example.to_file(path)?;

    println!("✅ Created example config at: {}", path.display());
    println!("   Put your API key in GEMINI_API_KEY or a .env file; it is never written to the config.");
    Ok(())
}

fn print_usage() {
    println!("Commands:");
    println!("  start                      Begin the journey");
    println!("  name <text>                Set your name");
    println!("  flower next|prev           Cycle the flower");
    println!("  color next|prev            Cycle the color");
    println!("  create                     Create the flower");
    println!("  continue | retry           Bouquet next, or back to choose again");
    println!("  final | yes                Move on to the question, and answer it");
    println!("  photo <path>               Your picture");
    println!("  partner <path>             Your favorite picture of him");
    println!("  clear photo|partner        Remove a picture");
    println!("  comic                      Draw the comic");
    println!("  share                      Share or save the comic");
    println!("  ok                         Dismiss a message");
    println!("  restart | quit");
}
