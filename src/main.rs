use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

mod build;
mod check;
mod config;
mod content;
mod error;
mod init;
mod kb;

#[derive(Parser)]
#[command(name = "kbgen", about = "知识库生成器：Markdown 文章 → api/kb.json", version = long_version())]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// 构建知识库 JSON 与文章页
    Build {
        /// 清除输出和缓存后全量重建
        #[arg(long)]
        clean: bool,

        /// 忽略缓存，重写所有输出
        #[arg(long)]
        force: bool,

        /// 项目根目录（默认当前目录）
        #[arg(short, long, default_value = ".")]
        root: PathBuf,
    },

    /// 检查配置和文章
    Check {
        /// 项目根目录（默认当前目录）
        #[arg(short, long, default_value = ".")]
        root: PathBuf,
    },

    /// 初始化项目骨架
    Init {
        /// 项目根目录（默认当前目录）
        #[arg(short, long, default_value = ".")]
        root: PathBuf,
    },
}

impl Commands {
    fn root(&self) -> &Path {
        match self {
            Commands::Build { root, .. } | Commands::Check { root } | Commands::Init { root } => {
                root
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // None 等同于 Build { root: "." }
    let command = cli.command.unwrap_or(Commands::Build {
        clean: false,
        force: false,
        root: PathBuf::from("."),
    });

    // 配置中的日志级别作为默认值，RUST_LOG 优先
    let root = command.root();
    let default_level = config::SiteConfig::load(&root.canonicalize().unwrap_or_else(|_| root.to_path_buf()))
        .ok()
        .map(|c| c.log.level);
    let default_level = default_level.as_deref().unwrap_or("info");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();

    match command {
        Commands::Build { clean, force, root } => {
            let root = root.canonicalize()?;
            if init::ensure_initialized(&root)? {
                tracing::info!("已自动初始化项目");
            }
            let site_config = config::SiteConfig::load(&root)?;
            build::run(&root, &site_config, build::BuildParams { clean, force })?;
        }
        Commands::Check { root } => {
            let root = root.canonicalize()?;
            let result = check::run(&root)?;

            for w in &result.warnings {
                tracing::warn!("{w}");
            }
            for e in &result.errors {
                tracing::error!("{e}");
            }

            if result.errors.is_empty() {
                tracing::info!("检查通过（{} 个警告）", result.warnings.len());
            } else {
                anyhow::bail!(
                    "检查未通过：{} 个错误，{} 个警告",
                    result.errors.len(),
                    result.warnings.len()
                );
            }
        }
        Commands::Init { root } => {
            std::fs::create_dir_all(&root)?;
            let root = root.canonicalize()?;
            if init::ensure_initialized(&root)? {
                tracing::info!("已初始化项目：{}", root.display());
            } else {
                tracing::info!("项目已存在，跳过初始化：{}", root.display());
            }
        }
    }

    Ok(())
}

const fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        "\ncommit:  ",
        env!("KBGEN_GIT_COMMIT"),
        "\nbuild:   ",
        env!("KBGEN_BUILD_TIME"),
        "\ntarget:  ",
        env!("KBGEN_BUILD_TARGET"),
    )
}
