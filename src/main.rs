use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use globset::{Glob, GlobSet, GlobSetBuilder};
use once_cell::sync::Lazy;
use path_clean::PathClean;
use regex::Regex;
use rustyline::{Editor, error::ReadlineError};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;
use tokio::time::Duration;

#[derive(Parser)]
#[command(name = "gamsctl")]
#[command(about = "Gams Catalog Manager", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    Add {
        game_id: String,
        #[arg(default_value = "Custom")]
        section: String,
        #[arg(long)]
        custom_img: bool,
    },
    Search {
        query: String,
    },
    Delete {
        name: String,
    },
    Duplicates,
    Orphans,
    List,
    AssignImage {
        name: String,
        url: Option<String>,
    },
    Backup,
}

const ID_PREFIX: &str = "cl";
const LIST_CLOSE: &str = "];";
const CATALOG_TIMEOUT: Duration = Duration::from_secs(10);
const ASSET_TIMEOUT: Duration = Duration::from_secs(15);

static CATALOG_LIST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)const files = \[(.*?)\];").unwrap());
static CATALOG_TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"'([^']+)'").unwrap());
static GAMS_LIST_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)var gamsList = \[(.*?)\];").unwrap());
static HREF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"href:\s*"([^"]+)""#).unwrap());
static LOWER_UPPER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([a-z])([A-Z])").unwrap());
static DIGIT_LETTER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([0-9])([a-zA-Z])").unwrap());

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    base_dir: String,
    catalog_url: String,
    asset_base_url: String,
    sections: Vec<String>,
    orphan_whitelist: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_dir: "/workspaces/Gams".to_string(),
            catalog_url: "https://cdn.jsdelivr.net/gh/bubbls/ugs-singlefile@main/AASINGLEFILE.html"
                .to_string(),
            asset_base_url: "https://cdn.jsdelivr.net/gh/bubbls/ugs-singlefile".to_string(),
            sections: [
                "Custom",
                "Basic",
                "Unity",
                "Retrogaming",
                "Henry Stickmin Flash",
                "Flash",
                "Tools",
            ]
            .map(String::from)
            .to_vec(),
            orphan_whitelist: ["Gam.html", "misc", "Ruffle", "webretro", "assets", "img"]
                .map(String::from)
                .to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ListEntry {
    Section { title: String },
    Game { name: String, href: Option<String> },
}

pub struct GamsManager {
    config: Config,
    paths: GamsPaths,
    client: reqwest::Client,
    catalog: Vec<String>,
    whitelist: Option<GlobSet>,
}

struct GamsPaths {
    base: PathBuf,
    games_dir: PathBuf,
    img_dir: PathBuf,
    list_file: PathBuf,
    default_image: PathBuf,
}

impl GamsPaths {
    fn new(config: &Config) -> Self {
        let base = PathBuf::from(&config.base_dir);
        Self {
            games_dir: base.join("g").join("g"),
            img_dir: base.join("img"),
            list_file: base.join("Gams.html"),
            default_image: base.join("img").join("gams.png"),
            base,
        }
    }

    fn thumbnail(&self, game_name: &str) -> PathBuf {
        self.img_dir.join(format!("{}.png", image_stem(game_name)))
    }
}

impl GamsManager {
    pub async fn new() -> Result<Self> {
        let config = Self::load_config().await?;
        Self::from_config(config)
    }

    async fn load_config() -> Result<Config> {
        match fs::read_to_string("config.toml").await {
            Ok(content) => toml::from_str(&content).context("Failed to parse config.toml"),
            Err(_) => Ok(Config::default()),
        }
    }

    fn from_config(config: Config) -> Result<Self> {
        Self::validate_config(&config)?;
        let paths = GamsPaths::new(&config);

        let whitelist = if !config.orphan_whitelist.is_empty() {
            let mut builder = GlobSetBuilder::new();

            for pattern in &config.orphan_whitelist {
                let glob = Glob::new(pattern)
                    .with_context(|| format!("Invalid whitelist pattern: {}", pattern))?;
                builder.add(glob);
            }

            Some(builder.build()?)
        } else {
            None
        };

        let client = reqwest::Client::builder()
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            config,
            paths,
            client,
            catalog: Vec::new(),
            whitelist,
        })
    }

    fn validate_config(config: &Config) -> Result<()> {
        if config.base_dir.trim().is_empty() {
            anyhow::bail!("base_dir must not be empty in config.toml");
        }
        if config.catalog_url.trim().is_empty() {
            anyhow::bail!("catalog_url must not be empty in config.toml");
        }
        if config.asset_base_url.trim().is_empty() {
            anyhow::bail!("asset_base_url must not be empty in config.toml");
        }
        Ok(())
    }

    fn is_whitelisted(&self, name: &str) -> bool {
        self.whitelist
            .as_ref()
            .is_some_and(|globset| globset.is_match(name))
    }

    async fn fetch_text(&self, url: &str, deadline: Duration) -> Result<String> {
        self.client
            .get(url)
            .timeout(deadline)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
            .map_err(Into::into)
    }

    async fn load_catalog(&mut self) -> &[String] {
        if !self.catalog.is_empty() {
            return &self.catalog;
        }

        match self
            .fetch_text(&self.config.catalog_url, CATALOG_TIMEOUT)
            .await
        {
            Ok(document) => match extract_catalog_ids(&document) {
                Some(ids) => {
                    println!("Loaded {} games from the catalog", ids.len());
                    self.catalog = ids;
                }
                None => eprintln!("Could not find the games list in the catalog source"),
            },
            Err(e) => eprintln!("Error loading catalog: {e:#}"),
        }

        &self.catalog
    }

    async fn search_catalog(&mut self, query: &str) -> Vec<String> {
        let query = query.to_lowercase();
        self.load_catalog()
            .await
            .iter()
            .filter(|id| {
                let clean = id.strip_prefix(ID_PREFIX).unwrap_or(id);
                clean.to_lowercase().contains(&query)
            })
            .cloned()
            .collect()
    }

    async fn save_game_file(&self, game_id: &str, content: &str) -> Result<PathBuf> {
        let path = self.paths.games_dir.join(asset_file_name(game_id));

        fs::create_dir_all(&self.paths.games_dir)
            .await
            .context("Failed to create games directory")?;
        fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(path)
    }

    async fn create_thumbnail(&self, game_name: &str) -> Result<()> {
        let target = self.paths.thumbnail(game_name);

        if fs::try_exists(&target).await? || !fs::try_exists(&self.paths.default_image).await? {
            return Ok(());
        }

        fs::copy(&self.paths.default_image, &target)
            .await
            .with_context(|| format!("Failed to copy logo to {}", target.display()))?;
        println!("Created thumbnail: {}", target.display());
        Ok(())
    }

    async fn read_document(&self) -> Result<String> {
        fs::read_to_string(&self.paths.list_file)
            .await
            .with_context(|| format!("Failed to read {}", self.paths.list_file.display()))
    }

    async fn write_document(&self, content: &str) -> Result<()> {
        fs::write(&self.paths.list_file, content)
            .await
            .with_context(|| format!("Failed to write {}", self.paths.list_file.display()))
    }

    async fn parse_list(&self) -> Vec<ListEntry> {
        let document = match self.read_document().await {
            Ok(document) => document,
            Err(e) => {
                eprintln!("{e:#}");
                return Vec::new();
            }
        };

        match parse_game_list(&document) {
            Some(entries) => entries,
            None => {
                eprintln!(
                    "Could not find gamsList in {}",
                    self.paths.list_file.display()
                );
                Vec::new()
            }
        }
    }

    async fn append_entry(&self, name: &str, section: &str, href: Option<&str>) -> Result<bool> {
        let document = self.read_document().await?;
        match insert_game_entry(&document, section, name, href) {
            Some(updated) => {
                self.write_document(&updated).await?;
                println!("Added '{name}' to '{section}' section");
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn add_game(
        &self,
        game_id: &str,
        name_override: Option<String>,
        section: &str,
        use_custom_image: bool,
    ) -> bool {
        let game_name = name_override.unwrap_or_else(|| display_name(game_id));
        println!("\nAdding game: {game_id}");
        println!("Game name: {game_name}");

        println!("Downloading game...");
        let url = format!("{}/{}.html", self.config.asset_base_url, game_id);
        let content = match self.fetch_text(&url, ASSET_TIMEOUT).await {
            Ok(content) => content,
            Err(e) => {
                eprintln!("Error downloading {game_id}: {e:#}");
                return false;
            }
        };

        let game_path = match self.save_game_file(game_id, &content).await {
            Ok(path) => path,
            Err(e) => {
                eprintln!("{e:#}");
                return false;
            }
        };
        println!("Saved to: {}", game_path.display());

        let href = format!("g/g/{}", asset_file_name(game_id));

        if use_custom_image {
            println!("Skipping thumbnail (custom image expected)");
        } else if let Err(e) = self.create_thumbnail(&game_name).await {
            // a failed thumbnail never undoes the saved game file
            eprintln!("Error creating thumbnail: {e:#}");
        }

        println!("Adding to game list...");
        match self.append_entry(&game_name, section, Some(&href)).await {
            Ok(true) => {
                println!("Successfully added '{game_name}'");
                true
            }
            Ok(false) => {
                eprintln!("Section '{section}' not found");
                false
            }
            Err(e) => {
                eprintln!("Error updating game list: {e:#}");
                false
            }
        }
    }

    async fn delete_game(&self, game_name: &str) -> bool {
        println!("\nDeleting game: {game_name}");

        let document = match self.read_document().await {
            Ok(document) => document,
            Err(e) => {
                eprintln!("{e:#}");
                return false;
            }
        };

        let Some((updated, href)) = remove_game_lines(&document, game_name) else {
            eprintln!(
                "Game '{game_name}' not found in {}",
                self.paths.list_file.display()
            );
            return false;
        };

        if let Err(e) = self.write_document(&updated).await {
            eprintln!("{e:#}");
            return false;
        }
        println!("Removed entry from {}", self.paths.list_file.display());

        let href = href.unwrap_or_else(|| format!("g/{}.html", image_stem(game_name)));
        if let Err(e) = self.remove_asset(&href).await {
            eprintln!("Error removing asset: {e:#}");
        }

        let thumbnail = self.paths.thumbnail(game_name);
        if matches!(fs::try_exists(&thumbnail).await, Ok(true))
            && fs::remove_file(&thumbnail).await.is_ok()
        {
            println!("Deleted thumbnail: {}", thumbnail.display());
        }

        println!("Successfully deleted '{game_name}'");
        true
    }

    async fn remove_asset(&self, href: &str) -> Result<()> {
        let target = self.paths.base.join(href).clean();

        if !fs::try_exists(&target).await? {
            println!("File not found at {}", target.display());
            return Ok(());
        }

        let meta = fs::metadata(&target).await?;
        if meta.is_dir() {
            fs::remove_dir_all(&target).await?;
            println!("Deleted directory: {}", target.display());
            return Ok(());
        }

        // a file nested in a per-game subdirectory of g/g/ takes the
        // whole subdirectory with it
        let parts: Vec<&str> = href.split('/').filter(|s| !s.is_empty()).collect();
        if parts.len() > 3 && parts[0] == "g" && parts[1] == "g" {
            let subdir = self.paths.games_dir.join(parts[2]);
            if fs::metadata(&subdir)
                .await
                .map(|m| m.is_dir())
                .unwrap_or(false)
            {
                fs::remove_dir_all(&subdir).await?;
                println!("Deleted game directory: {}", subdir.display());
                return Ok(());
            }
        }

        fs::remove_file(&target).await?;
        println!("Deleted file: {}", target.display());
        Ok(())
    }

    async fn cmd_duplicates(&self, rl: &mut Editor<()>) -> Result<()> {
        println!("\nScanning for duplicates...");
        let entries = self.parse_list().await;
        let duplicates = duplicate_names(&entries);

        if duplicates.is_empty() {
            println!("No duplicate names found.");
            return Ok(());
        }

        println!("Found {} duplicate game names:", duplicates.len());
        for name in &duplicates {
            println!("  - {name}");
        }

        if confirm(rl, "\nDelete duplicates? (y/N): ") {
            let document = self.read_document().await?;
            let (updated, dropped) = remove_duplicate_lines(&document, &duplicates);
            self.write_document(&updated).await?;
            println!("Removed {dropped} duplicate lines");
        }

        Ok(())
    }

    async fn scan_orphans(&self) -> Result<Vec<PathBuf>> {
        let entries = self.parse_list().await;
        let linked = linked_basenames(&entries);

        let mut orphans = Vec::new();
        let mut dir = fs::read_dir(&self.paths.games_dir)
            .await
            .with_context(|| format!("Failed to read {}", self.paths.games_dir.display()))?;

        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if linked.contains(&name) || self.is_whitelisted(&name) {
                continue;
            }
            orphans.push(entry.path());
        }

        orphans.sort();
        Ok(orphans)
    }

    async fn cmd_orphans(&self, rl: &mut Editor<()>) -> Result<()> {
        println!("\nScanning for orphaned files...");
        let orphans = self.scan_orphans().await?;

        if orphans.is_empty() {
            println!("No orphaned files found.");
            return Ok(());
        }

        println!(
            "Found {} orphaned items in {}:",
            orphans.len(),
            self.paths.games_dir.display()
        );
        for path in &orphans {
            let is_dir = fs::metadata(path)
                .await
                .map(|m| m.is_dir())
                .unwrap_or(false);
            println!(
                "  - {} ({})",
                path.file_name().unwrap_or_default().to_string_lossy(),
                if is_dir { "DIR" } else { "FILE" }
            );
        }

        if !confirm(rl, "\nDelete orphaned files? (y/N): ") {
            return Ok(());
        }

        for path in &orphans {
            let is_dir = fs::metadata(path)
                .await
                .map(|m| m.is_dir())
                .unwrap_or(false);
            let result = if is_dir {
                fs::remove_dir_all(path).await
            } else {
                fs::remove_file(path).await
            };
            match result {
                Ok(()) => println!("  deleted {}", path.display()),
                Err(e) => eprintln!("  error deleting {}: {e}", path.display()),
            }
        }

        Ok(())
    }

    async fn cmd_list(&self) {
        let entries = self.parse_list().await;

        println!("\nInstalled games:");
        let mut total = 0;
        for entry in &entries {
            match entry {
                ListEntry::Section { title } => println!("\n--- {title} ---"),
                ListEntry::Game { name, .. } => {
                    println!("  - {name}");
                    total += 1;
                }
            }
        }
        println!("\nTotal entries: {total}");
    }

    async fn assign_image(&self, game_name: &str, source: Option<&str>) -> bool {
        println!("\nAssigning image to: {game_name}");
        let target = self.paths.thumbnail(game_name);

        let result = match source {
            Some(url) => self.download_image(url, &target).await,
            None => self.copy_default_image(&target).await,
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                eprintln!("Error assigning image: {e:#}");
                false
            }
        }
    }

    async fn download_image(&self, url: &str, target: &Path) -> Result<()> {
        println!("Downloading image from: {url}");
        let bytes = self
            .client
            .get(url)
            .timeout(ASSET_TIMEOUT)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(target, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", target.display()))?;
        println!("Assigned custom thumbnail: {}", target.display());
        Ok(())
    }

    async fn copy_default_image(&self, target: &Path) -> Result<()> {
        if !fs::try_exists(&self.paths.default_image).await? {
            anyhow::bail!(
                "default logo not found at {}",
                self.paths.default_image.display()
            );
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::copy(&self.paths.default_image, target).await?;
        println!("Assigned default thumbnail: {}", target.display());
        Ok(())
    }

    async fn backup_document(&self) -> bool {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let backup = PathBuf::from(format!("{}.bak.{stamp}", self.paths.list_file.display()));

        match fs::copy(&self.paths.list_file, &backup).await {
            Ok(_) => {
                println!("Backup created: {}", backup.display());
                true
            }
            Err(e) => {
                eprintln!("Backup failed: {e}");
                false
            }
        }
    }

    async fn menu_add(&mut self, rl: &mut Editor<()>) -> Result<()> {
        println!("\nAdd game:");
        println!("1. Search for a game");
        println!("2. Browse by letter");
        println!("3. Back");

        match prompt(rl, "\nSelect option (1-3): ").as_deref() {
            Some("1") => self.menu_search_and_add(rl).await,
            Some("2") => self.menu_browse_by_letter(rl).await,
            _ => Ok(()),
        }
    }

    async fn menu_search_and_add(&mut self, rl: &mut Editor<()>) -> Result<()> {
        let Some(query) = prompt(rl, "Enter search term: ") else {
            return Ok(());
        };
        if query.is_empty() {
            return Ok(());
        }

        let matches = self.search_catalog(&query).await;
        if matches.is_empty() {
            println!("No games found");
            return Ok(());
        }

        self.pick_and_install(rl, &matches).await
    }

    async fn menu_browse_by_letter(&mut self, rl: &mut Editor<()>) -> Result<()> {
        let catalog = self.load_catalog().await.to_vec();
        if catalog.is_empty() {
            println!("Could not load the catalog");
            return Ok(());
        }

        let mut letters: Vec<char> = catalog.iter().map(|id| first_letter(id)).collect();
        letters.sort_unstable();
        letters.dedup();

        println!(
            "\nAvailable letters: {}",
            letters
                .iter()
                .map(char::to_string)
                .collect::<Vec<_>>()
                .join(" ")
        );

        let Some(input) = prompt(rl, "Enter letter: ") else {
            return Ok(());
        };
        let Some(letter) = input.to_uppercase().chars().next() else {
            return Ok(());
        };
        if !letters.contains(&letter) {
            println!("Invalid letter");
            return Ok(());
        }

        let filtered: Vec<String> = catalog
            .into_iter()
            .filter(|id| first_letter(id) == letter)
            .collect();

        println!("\nGames starting with '{letter}':");
        self.pick_and_install(rl, &filtered).await
    }

    async fn pick_and_install(&mut self, rl: &mut Editor<()>, matches: &[String]) -> Result<()> {
        println!("\nFound {} games:", matches.len());
        let shown = matches.len().min(10);
        for (i, id) in matches.iter().take(10).enumerate() {
            println!("{:2}. {}", i + 1, display_name(id));
        }
        if matches.len() > 10 {
            println!("... and {} more", matches.len() - 10);
        }

        let Some(selection) = prompt(rl, &format!("\nSelect game (1-{shown}): ")) else {
            return Ok(());
        };
        match selection.parse::<usize>() {
            Ok(n) if (1..=shown).contains(&n) => self.install_selection(rl, &matches[n - 1]).await,
            _ => {
                println!("Invalid selection");
                Ok(())
            }
        }
    }

    async fn install_selection(&mut self, rl: &mut Editor<()>, game_id: &str) -> Result<()> {
        let default_name = display_name(game_id);
        println!("\nSelected: {default_name}");

        let Some(custom) = prompt(rl, &format!("Enter game name (ENTER for '{default_name}'): "))
        else {
            return Ok(());
        };
        let game_name = if custom.is_empty() {
            default_name
        } else {
            custom
        };

        println!("Available sections:");
        for (i, section) in self.config.sections.iter().enumerate() {
            println!("{}. {}", i + 1, section);
        }

        let count = self.config.sections.len();
        let Some(choice) = prompt(rl, &format!("Select section (1-{count}): ")) else {
            return Ok(());
        };
        let Ok(n) = choice.parse::<usize>() else {
            println!("Invalid input");
            return Ok(());
        };
        if !(1..=count).contains(&n) {
            println!("Invalid section");
            return Ok(());
        }
        let section = self.config.sections[n - 1].clone();

        let use_custom = confirm(rl, "Use custom image? (y/N): ");
        self.add_game(game_id, Some(game_name), &section, use_custom)
            .await;
        Ok(())
    }

    async fn menu_delete(&mut self, rl: &mut Editor<()>) -> Result<()> {
        println!("\nDelete game:");
        let Some(name) = self.pick_installed(rl, "Select game to delete:").await else {
            return Ok(());
        };

        let answer = prompt(
            rl,
            &format!("Are you sure you want to delete '{name}'? (yes/no): "),
        );
        if answer.is_some_and(|a| a.eq_ignore_ascii_case("yes")) {
            self.delete_game(&name).await;
        }
        Ok(())
    }

    async fn menu_assign_image(&mut self, rl: &mut Editor<()>) -> Result<()> {
        println!("\nAssign image:");
        let Some(name) = self.pick_installed(rl, "Select game to assign image:").await else {
            return Ok(());
        };

        println!("\nImage source options:");
        println!("1. Use default logo");
        println!("2. Provide custom image URL");

        match prompt(rl, "Select option (1-2): ").as_deref() {
            Some("1") => {
                self.assign_image(&name, None).await;
            }
            Some("2") => {
                let Some(url) = prompt(rl, "Enter image URL: ") else {
                    return Ok(());
                };
                if url.is_empty() {
                    println!("No URL provided");
                } else {
                    self.assign_image(&name, Some(&url)).await;
                }
            }
            _ => println!("Invalid option"),
        }
        Ok(())
    }

    async fn pick_installed(&self, rl: &mut Editor<()>, header: &str) -> Option<String> {
        let entries = self.parse_list().await;
        let games: Vec<String> = entries
            .iter()
            .filter_map(|entry| match entry {
                ListEntry::Game { name, .. } => Some(name.clone()),
                ListEntry::Section { .. } => None,
            })
            .collect();

        println!("Found {} installed games.", games.len());
        let search = prompt(rl, "Enter game name to search (ENTER to list all): ")?.to_lowercase();

        let matches: Vec<&String> = games
            .iter()
            .filter(|game| game.to_lowercase().contains(&search))
            .collect();
        if matches.is_empty() {
            println!("No games found.");
            return None;
        }

        println!("\n{header}");
        for (i, game) in matches.iter().take(20).enumerate() {
            println!("{}. {}", i + 1, game);
        }
        if matches.len() > 20 {
            println!("... and {} more", matches.len() - 20);
        }

        let selection = prompt(rl, "\nSelect number (0 to cancel): ")?;
        if selection.is_empty() || selection == "0" {
            return None;
        }
        match selection.parse::<usize>() {
            Ok(n) if (1..=matches.len()).contains(&n) => Some(matches[n - 1].clone()),
            _ => {
                println!("Invalid selection");
                None
            }
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        println!("Gams Management Console");

        let mut rl = Editor::<()>::new().context("Failed to create readline editor")?;
        let _ = rl.load_history(".history");

        loop {
            println!("\n{:-<50}", " MAIN MENU ");
            println!("1. Add new game");
            println!("2. Delete game");
            println!("3. Find duplicates");
            println!("4. Clean orphaned files");
            println!("5. List all games");
            println!("6. Assign image");
            println!("7. Backup {}", self.paths.list_file.display());
            println!("8. Exit");

            let Some(choice) = prompt(&mut rl, "\nSelect option (1-8): ") else {
                break;
            };

            let result = match choice.as_str() {
                "1" => self.menu_add(&mut rl).await,
                "2" => self.menu_delete(&mut rl).await,
                "3" => self.cmd_duplicates(&mut rl).await,
                "4" => self.cmd_orphans(&mut rl).await,
                "5" => {
                    self.cmd_list().await;
                    Ok(())
                }
                "6" => self.menu_assign_image(&mut rl).await,
                "7" => {
                    self.backup_document().await;
                    Ok(())
                }
                "8" | "exit" | "quit" => break,
                "" => Ok(()),
                other => {
                    println!("Invalid option: {other}");
                    Ok(())
                }
            };

            if let Err(e) = result {
                eprintln!("Error: {e:#}");
            }
        }

        let _ = rl.save_history(".history");
        println!("Goodbye!");
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut manager = GamsManager::new()
        .await
        .context("Failed to initialize manager")?;

    match cli.command {
        Some(Commands::Add {
            game_id,
            section,
            custom_img,
        }) => {
            manager.add_game(&game_id, None, &section, custom_img).await;
        }
        Some(Commands::Search { query }) => {
            for id in manager.search_catalog(&query).await.iter().take(10) {
                println!("{} -> {}", id, display_name(id));
            }
        }
        Some(Commands::Delete { name }) => {
            manager.delete_game(&name).await;
        }
        Some(Commands::Duplicates) => {
            let mut rl = Editor::<()>::new().context("Failed to create readline editor")?;
            manager.cmd_duplicates(&mut rl).await?;
        }
        Some(Commands::Orphans) => {
            let mut rl = Editor::<()>::new().context("Failed to create readline editor")?;
            manager.cmd_orphans(&mut rl).await?;
        }
        Some(Commands::List) => manager.cmd_list().await,
        Some(Commands::AssignImage { name, url }) => {
            manager.assign_image(&name, url.as_deref()).await;
        }
        Some(Commands::Backup) => {
            manager.backup_document().await;
        }
        None => {
            manager.run().await?; // interactive mode
        }
    }

    Ok(())
}

fn prompt(rl: &mut Editor<()>, text: &str) -> Option<String> {
    match rl.readline(text) {
        Ok(line) => Some(line.trim().to_string()),
        Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => None,
        Err(e) => {
            eprintln!("Readline error: {}", e);
            None
        }
    }
}

fn confirm(rl: &mut Editor<()>, text: &str) -> bool {
    prompt(rl, text).is_some_and(|answer| answer.to_lowercase().starts_with('y'))
}

fn display_name(game_id: &str) -> String {
    let clean = game_id.strip_prefix(ID_PREFIX).unwrap_or(game_id);
    let spaced = LOWER_UPPER_RE.replace_all(clean, "$1 $2");
    let spaced = DIGIT_LETTER_RE.replace_all(&spaced, "$1 $2");

    spaced
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn image_stem(game_name: &str) -> String {
    game_name.to_lowercase().replace(' ', "")
}

fn asset_file_name(game_id: &str) -> String {
    let stem = game_id.strip_prefix(ID_PREFIX).unwrap_or(game_id);
    format!("{stem}.html")
}

fn first_letter(game_id: &str) -> char {
    game_id
        .strip_prefix(ID_PREFIX)
        .and_then(|rest| rest.chars().next())
        .map(|c| c.to_ascii_uppercase())
        .unwrap_or('A')
}

fn extract_catalog_ids(document: &str) -> Option<Vec<String>> {
    let body = CATALOG_LIST_RE.captures(document)?.get(1)?.as_str();
    Some(
        CATALOG_TOKEN_RE
            .captures_iter(body)
            .map(|capture| capture[1].to_string())
            .filter(|id| id.starts_with(ID_PREFIX))
            .collect(),
    )
}

fn section_marker(title: &str) -> String {
    format!("{{title: \"{title}\", type: \"section\"}}")
}

// no escaping of quotes in names; an embedded '"' breaks the entry
fn render_entry(name: &str, href: Option<&str>) -> String {
    match href {
        Some(path) => format!("{{name: \"{name}\", href: \"{path}\"}}"),
        None => format!("{{name: \"{name}\"}}"),
    }
}

fn insert_game_entry(
    document: &str,
    section: &str,
    name: &str,
    href: Option<&str>,
) -> Option<String> {
    let lines: Vec<&str> = document.split('\n').collect();
    let marker = section_marker(section);
    let start = lines.iter().position(|line| line.contains(&marker))?;

    // the entry lands at the end of the section: past every entry line,
    // before the next section marker or the closing bracket
    let mut insert_at = start + 1;
    for (i, line) in lines.iter().enumerate().skip(start + 1) {
        let trimmed = line.trim();
        if trimmed.starts_with("{title:") || trimmed == LIST_CLOSE {
            break;
        }
        insert_at = i + 1;
    }

    let entry = format!("  {},", render_entry(name, href));
    let mut out = lines;
    out.insert(insert_at, &entry);
    Some(out.join("\n"))
}

// substring containment: a line whose serialized text embeds the needle is
// removed even when it belongs to a different entry
fn remove_game_lines(document: &str, name: &str) -> Option<(String, Option<String>)> {
    let needle = format!("name: \"{name}\"");
    let mut href = None;
    let mut removed = false;
    let mut kept = Vec::new();

    for line in document.split('\n') {
        if line.contains(&needle) {
            removed = true;
            if let Some(capture) = HREF_RE.captures(line) {
                href = Some(capture[1].to_string());
            }
            continue;
        }
        kept.push(line);
    }

    removed.then(|| (kept.join("\n"), href))
}

fn duplicate_names(entries: &[ListEntry]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut duplicates = Vec::new();

    for entry in entries {
        if let ListEntry::Game { name, .. } = entry {
            if !seen.insert(name.clone()) && !duplicates.contains(name) {
                duplicates.push(name.clone());
            }
        }
    }

    duplicates
}

fn remove_duplicate_lines(document: &str, names: &[String]) -> (String, usize) {
    let mut kept = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut dropped = 0;

    for line in document.split('\n') {
        let duplicate = names
            .iter()
            .find(|name| line.contains(&format!("name: \"{name}\"")));
        match duplicate {
            Some(name) if !seen.insert(name.as_str()) => dropped += 1,
            _ => kept.push(line),
        }
    }

    (kept.join("\n"), dropped)
}

fn linked_basenames(entries: &[ListEntry]) -> HashSet<String> {
    let mut linked = HashSet::new();

    for entry in entries {
        if let ListEntry::Game {
            href: Some(href), ..
        } = entry
        {
            let parts: Vec<&str> = href.split('/').filter(|s| !s.is_empty()).collect();
            if parts.len() > 2 && parts[0] == "g" && parts[1] == "g" {
                linked.insert(parts[2].to_string());
            }
        }
    }

    linked
}

fn parse_game_list(document: &str) -> Option<Vec<ListEntry>> {
    let body = GAMS_LIST_RE.captures(document)?.get(1)?.as_str();
    Some(parse_entries(body))
}

// Minimal recursive-descent scan over the array body. Strings honor
// backslash escapes and nested values are skipped whole, so one odd
// fragment cannot corrupt the rest of the parse.
fn parse_entries(body: &str) -> Vec<ListEntry> {
    let mut parser = EntryParser::new(body);
    let mut entries = Vec::new();

    while let Some(fields) = parser.next_object() {
        if let Some(title) = fields.get("title") {
            entries.push(ListEntry::Section {
                title: title.clone(),
            });
        } else if let Some(name) = fields.get("name") {
            entries.push(ListEntry::Game {
                name: name.clone(),
                href: fields.get("href").cloned(),
            });
        }
    }

    entries
}

struct EntryParser {
    chars: Vec<char>,
    pos: usize,
}

impl EntryParser {
    fn new(src: &str) -> Self {
        Self {
            chars: src.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_separators(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace() || c == ',') {
            self.pos += 1;
        }
    }

    // advance to the next object; a malformed one is abandoned and the
    // scan resumes after its opening brace
    fn next_object(&mut self) -> Option<HashMap<String, String>> {
        loop {
            while let Some(c) = self.peek() {
                if c == '{' {
                    break;
                }
                self.pos += 1;
            }
            self.peek()?;

            let restart = self.pos + 1;
            match self.parse_object() {
                Some(fields) => return Some(fields),
                None => self.pos = restart,
            }
        }
    }

    fn parse_object(&mut self) -> Option<HashMap<String, String>> {
        self.pos += 1; // opening brace
        let mut fields = HashMap::new();

        loop {
            self.skip_separators();
            if self.peek()? == '}' {
                self.pos += 1;
                return Some(fields);
            }

            let key = self.parse_key()?;
            self.skip_separators();
            if self.peek()? != ':' {
                return None;
            }
            self.pos += 1;
            self.skip_separators();

            match self.peek()? {
                '"' | '\'' => {
                    let value = self.parse_string()?;
                    fields.insert(key, value);
                }
                _ => self.skip_value()?,
            }
        }
    }

    fn parse_key(&mut self) -> Option<String> {
        let mut key = String::new();
        while let Some(c) = self.peek() {
            match c {
                '"' | '\'' => self.pos += 1,
                c if c.is_alphanumeric() || c == '_' => {
                    key.push(c);
                    self.pos += 1;
                }
                _ => break,
            }
        }
        (!key.is_empty()).then_some(key)
    }

    fn parse_string(&mut self) -> Option<String> {
        let quote = self.bump()?;
        let mut out = String::new();

        while let Some(c) = self.bump() {
            match c {
                '\\' => out.push(self.bump()?),
                c if c == quote => return Some(out),
                c => out.push(c),
            }
        }
        None // unterminated
    }

    fn skip_value(&mut self) -> Option<()> {
        let mut depth = 0usize;

        while let Some(c) = self.peek() {
            match c {
                '{' | '[' => {
                    depth += 1;
                    self.pos += 1;
                }
                '}' | ']' if depth == 0 => return Some(()),
                '}' | ']' => {
                    depth -= 1;
                    self.pos += 1;
                }
                ',' if depth == 0 => return Some(()),
                '"' | '\'' => {
                    self.parse_string()?;
                }
                _ => self.pos += 1,
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE_DOC: &str = r#"<!DOCTYPE html>
<script>
var gamsList = [
{title: "Custom", type: "section"},
  {name: "Alpha", href: "g/g/alpha.html"},
  {name: "Beta"},
{title: "Basic", type: "section"},
  {name: "Gamma", href: "g/g/gamma/index.html"},
];
</script>
"#;

    fn test_config(base: &Path) -> Config {
        Config {
            base_dir: base.to_string_lossy().into_owned(),
            ..Config::default()
        }
    }

    fn manager_at(base: &Path) -> GamsManager {
        GamsManager::from_config(test_config(base)).unwrap()
    }

    #[test]
    fn display_name_spaces_camel_and_digit_boundaries() {
        assert_eq!(display_name("clSuperMarioBros"), "Super Mario Bros");
        assert_eq!(display_name("cl4WheelMadness"), "4 Wheel Madness");
    }

    #[test]
    fn display_name_is_idempotent_on_normalized_input() {
        let name = display_name("clHenryStickmin2");
        assert_eq!(display_name(&name), name);
        assert_eq!(display_name("Super Mario Bros"), "Super Mario Bros");
    }

    #[test]
    fn display_name_collapses_whitespace() {
        assert_eq!(display_name("foo \t bar"), "Foo Bar");
        assert_eq!(display_name(""), "");
    }

    #[test]
    fn extract_catalog_ids_filters_by_prefix() {
        let html = "junk\nconst files = [\n  'clFoo',\n  'xyBar',\n  'clBaz'\n];\nrest";
        assert_eq!(
            extract_catalog_ids(html),
            Some(vec!["clFoo".to_string(), "clBaz".to_string()])
        );
    }

    #[test]
    fn extract_catalog_ids_reports_missing_list() {
        assert_eq!(extract_catalog_ids("<html>no list here</html>"), None);
    }

    #[test]
    fn parse_game_list_classifies_sections_and_games() {
        let entries = parse_game_list(SAMPLE_DOC).unwrap();
        assert_eq!(
            entries,
            vec![
                ListEntry::Section {
                    title: "Custom".into()
                },
                ListEntry::Game {
                    name: "Alpha".into(),
                    href: Some("g/g/alpha.html".into())
                },
                ListEntry::Game {
                    name: "Beta".into(),
                    href: None
                },
                ListEntry::Section {
                    title: "Basic".into()
                },
                ListEntry::Game {
                    name: "Gamma".into(),
                    href: Some("g/g/gamma/index.html".into())
                },
            ]
        );
    }

    #[test]
    fn parse_entries_handles_escapes_and_nested_values() {
        let body = r#"{name: "Say \"Hi\"", href: "g/g/hi.html"}, {name: "Nested", meta: {depth: "2"}}, {broken: }"#;
        let entries = parse_entries(body);
        assert_eq!(
            entries,
            vec![
                ListEntry::Game {
                    name: "Say \"Hi\"".into(),
                    href: Some("g/g/hi.html".into())
                },
                ListEntry::Game {
                    name: "Nested".into(),
                    href: None
                },
            ]
        );
    }

    #[test]
    fn parse_entries_drops_unterminated_fragment() {
        let entries = parse_entries(r#"{name: "Ok"}, {name: "Broken"#);
        assert_eq!(
            entries,
            vec![ListEntry::Game {
                name: "Ok".into(),
                href: None
            }]
        );
    }

    #[test]
    fn insert_lands_at_end_of_target_section() {
        let updated =
            insert_game_entry(SAMPLE_DOC, "Custom", "Foo Bar", Some("g/g/foobar.html")).unwrap();
        let lines: Vec<&str> = updated.split('\n').collect();

        let entry = lines
            .iter()
            .position(|l| l.contains(r#"name: "Foo Bar""#))
            .unwrap();
        let basic = lines
            .iter()
            .position(|l| l.contains(r#"{title: "Basic", type: "section"}"#))
            .unwrap();

        assert_eq!(
            lines[entry],
            r#"  {name: "Foo Bar", href: "g/g/foobar.html"},"#
        );
        assert_eq!(entry + 1, basic);
    }

    #[test]
    fn insert_into_last_section_lands_before_closing_bracket() {
        let updated = insert_game_entry(SAMPLE_DOC, "Basic", "Zed", None).unwrap();
        let lines: Vec<&str> = updated.split('\n').collect();

        let entry = lines
            .iter()
            .position(|l| l.contains(r#"name: "Zed""#))
            .unwrap();
        assert_eq!(lines[entry], r#"  {name: "Zed"},"#);
        assert_eq!(lines[entry + 1].trim(), LIST_CLOSE);
    }

    #[test]
    fn insert_into_empty_section_stays_within_it() {
        let doc = "var gamsList = [\n{title: \"Custom\", type: \"section\"},\n{title: \"Basic\", type: \"section\"},\n];\n";
        let updated = insert_game_entry(doc, "Custom", "Solo", None).unwrap();
        let lines: Vec<&str> = updated.split('\n').collect();

        assert_eq!(lines[2], "  {name: \"Solo\"},");
        assert!(lines[3].contains(r#"{title: "Basic""#));
    }

    #[test]
    fn insert_reports_missing_section() {
        assert!(insert_game_entry(SAMPLE_DOC, "Arcade", "Foo", None).is_none());
    }

    #[test]
    fn insert_then_parse_places_entry_inside_section() {
        let updated =
            insert_game_entry(SAMPLE_DOC, "Custom", "Foo Bar", Some("g/g/foobar.html")).unwrap();
        let entries = parse_game_list(&updated).unwrap();

        let custom = entries
            .iter()
            .position(|e| matches!(e, ListEntry::Section { title } if title == "Custom"))
            .unwrap();
        let basic = entries
            .iter()
            .position(|e| matches!(e, ListEntry::Section { title } if title == "Basic"))
            .unwrap();
        let added = entries
            .iter()
            .position(|e| matches!(e, ListEntry::Game { name, .. } if name == "Foo Bar"))
            .unwrap();

        assert!(custom < added && added < basic);
        assert_eq!(added + 1, basic);
    }

    #[test]
    fn remove_takes_only_the_matching_line() {
        let (updated, href) = remove_game_lines(SAMPLE_DOC, "Alpha").unwrap();
        assert_eq!(href.as_deref(), Some("g/g/alpha.html"));
        assert!(!updated.contains(r#"name: "Alpha""#));
        assert!(updated.contains(r#"name: "Beta""#));
        assert!(updated.contains(r#"name: "Gamma""#));
    }

    #[test]
    fn remove_without_href_yields_none_href() {
        let (updated, href) = remove_game_lines(SAMPLE_DOC, "Beta").unwrap();
        assert!(href.is_none());
        assert!(!updated.contains(r#"name: "Beta""#));
    }

    #[test]
    fn remove_missing_name_leaves_document_untouched() {
        assert!(remove_game_lines(SAMPLE_DOC, "Nope").is_none());
    }

    #[test]
    fn duplicate_names_reports_each_shared_name_once() {
        let entries = vec![
            ListEntry::Game {
                name: "Alpha".into(),
                href: None,
            },
            ListEntry::Game {
                name: "Beta".into(),
                href: None,
            },
            ListEntry::Game {
                name: "Alpha".into(),
                href: None,
            },
            ListEntry::Game {
                name: "Alpha".into(),
                href: None,
            },
        ];
        assert_eq!(duplicate_names(&entries), vec!["Alpha".to_string()]);
    }

    #[test]
    fn remove_duplicate_lines_keeps_first_occurrence() {
        let doc = "var gamsList = [\n  {name: \"Alpha\", href: \"g/g/a1.html\"},\n  {name: \"Beta\"},\n  {name: \"Alpha\", href: \"g/g/a2.html\"},\n];";
        let (updated, dropped) = remove_duplicate_lines(doc, &["Alpha".to_string()]);

        assert_eq!(dropped, 1);
        assert!(updated.contains("a1.html"));
        assert!(!updated.contains("a2.html"));
        assert!(updated.contains(r#"name: "Beta""#));
    }

    #[test]
    fn linked_basenames_cover_files_and_subdirectories() {
        let entries = parse_game_list(SAMPLE_DOC).unwrap();
        let linked = linked_basenames(&entries);

        assert!(linked.contains("alpha.html"));
        assert!(linked.contains("gamma"));
        assert_eq!(linked.len(), 2);
    }

    #[tokio::test]
    async fn save_game_file_strips_prefix_and_creates_dirs() {
        let tmp = TempDir::new().unwrap();
        let manager = manager_at(tmp.path());

        let path = manager.save_game_file("clFoo", "<html>").await.unwrap();

        assert_eq!(path, tmp.path().join("g").join("g").join("Foo.html"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "<html>");
    }

    #[tokio::test]
    async fn create_thumbnail_respects_existing_file() {
        let tmp = TempDir::new().unwrap();
        let manager = manager_at(tmp.path());
        std::fs::create_dir_all(&manager.paths.img_dir).unwrap();
        std::fs::write(&manager.paths.default_image, b"logo").unwrap();

        manager.create_thumbnail("Foo Bar").await.unwrap();
        let thumb = manager.paths.thumbnail("Foo Bar");
        assert_eq!(std::fs::read(&thumb).unwrap(), b"logo");

        std::fs::write(&thumb, b"custom").unwrap();
        manager.create_thumbnail("Foo Bar").await.unwrap();
        assert_eq!(std::fs::read(&thumb).unwrap(), b"custom");
    }

    #[tokio::test]
    async fn append_entry_round_trips_through_document() {
        let tmp = TempDir::new().unwrap();
        let manager = manager_at(tmp.path());
        std::fs::write(&manager.paths.list_file, SAMPLE_DOC).unwrap();

        let added = manager
            .append_entry("Foo Bar", "Custom", Some("g/g/foobar.html"))
            .await
            .unwrap();
        assert!(added);

        let document = std::fs::read_to_string(&manager.paths.list_file).unwrap();
        let entries = parse_game_list(&document).unwrap();
        let added_at = entries
            .iter()
            .position(|e| matches!(e, ListEntry::Game { name, .. } if name == "Foo Bar"))
            .unwrap();
        let basic = entries
            .iter()
            .position(|e| matches!(e, ListEntry::Section { title } if title == "Basic"))
            .unwrap();
        assert_eq!(added_at + 1, basic);
    }

    #[tokio::test]
    async fn append_entry_missing_section_changes_nothing() {
        let tmp = TempDir::new().unwrap();
        let manager = manager_at(tmp.path());
        std::fs::write(&manager.paths.list_file, SAMPLE_DOC).unwrap();

        let added = manager.append_entry("Foo", "Arcade", None).await.unwrap();
        assert!(!added);
        assert_eq!(
            std::fs::read_to_string(&manager.paths.list_file).unwrap(),
            SAMPLE_DOC
        );
    }

    #[tokio::test]
    async fn delete_game_removes_entry_asset_and_thumbnail() {
        let tmp = TempDir::new().unwrap();
        let manager = manager_at(tmp.path());
        std::fs::create_dir_all(&manager.paths.games_dir).unwrap();
        std::fs::create_dir_all(&manager.paths.img_dir).unwrap();
        std::fs::write(&manager.paths.list_file, SAMPLE_DOC).unwrap();
        std::fs::write(manager.paths.games_dir.join("alpha.html"), "x").unwrap();
        std::fs::write(manager.paths.img_dir.join("alpha.png"), "img").unwrap();

        assert!(manager.delete_game("Alpha").await);

        let document = std::fs::read_to_string(&manager.paths.list_file).unwrap();
        assert!(!document.contains(r#"name: "Alpha""#));
        assert!(document.contains(r#"name: "Beta""#));
        assert!(!manager.paths.games_dir.join("alpha.html").exists());
        assert!(!manager.paths.img_dir.join("alpha.png").exists());
    }

    #[tokio::test]
    async fn delete_game_removes_per_game_subdirectory() {
        let tmp = TempDir::new().unwrap();
        let manager = manager_at(tmp.path());
        let subdir = manager.paths.games_dir.join("gamma");
        std::fs::create_dir_all(&subdir).unwrap();
        std::fs::write(subdir.join("index.html"), "x").unwrap();
        std::fs::write(&manager.paths.list_file, SAMPLE_DOC).unwrap();

        assert!(manager.delete_game("Gamma").await);
        assert!(!subdir.exists());
    }

    #[tokio::test]
    async fn delete_game_missing_name_leaves_document_identical() {
        let tmp = TempDir::new().unwrap();
        let manager = manager_at(tmp.path());
        std::fs::write(&manager.paths.list_file, SAMPLE_DOC).unwrap();

        assert!(!manager.delete_game("Nope").await);
        assert_eq!(
            std::fs::read_to_string(&manager.paths.list_file).unwrap(),
            SAMPLE_DOC
        );
    }

    #[tokio::test]
    async fn scan_orphans_excludes_linked_and_whitelisted() {
        let tmp = TempDir::new().unwrap();
        let manager = manager_at(tmp.path());
        std::fs::create_dir_all(&manager.paths.games_dir).unwrap();
        std::fs::write(&manager.paths.list_file, SAMPLE_DOC).unwrap();
        std::fs::write(manager.paths.games_dir.join("alpha.html"), "x").unwrap();
        std::fs::write(manager.paths.games_dir.join("b.html"), "x").unwrap();
        std::fs::write(manager.paths.games_dir.join("c.html"), "x").unwrap();
        std::fs::create_dir_all(manager.paths.games_dir.join("gamma")).unwrap();
        std::fs::create_dir_all(manager.paths.games_dir.join("misc")).unwrap();

        let orphans = manager.scan_orphans().await.unwrap();
        assert_eq!(
            orphans,
            vec![
                manager.paths.games_dir.join("b.html"),
                manager.paths.games_dir.join("c.html"),
            ]
        );
    }

    #[tokio::test]
    async fn backup_copies_document() {
        let tmp = TempDir::new().unwrap();
        let manager = manager_at(tmp.path());
        std::fs::write(&manager.paths.list_file, SAMPLE_DOC).unwrap();

        assert!(manager.backup_document().await);

        let backup = std::fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|entry| entry.ok())
            .find(|entry| {
                entry
                    .file_name()
                    .to_string_lossy()
                    .starts_with("Gams.html.bak.")
            })
            .unwrap();
        assert_eq!(std::fs::read_to_string(backup.path()).unwrap(), SAMPLE_DOC);
    }
}
