use std::path::{Path, PathBuf};

use clap::Parser;
use quill_client::form::{PostForm, SubmitTarget};
use quill_client::{HttpPostApi, ImageFile, PostApi};
use uuid::Uuid;

#[derive(Parser, Debug)]
struct Cli {
    #[clap(short, long)]
    server: Option<String>,

    /// Bearer token issued by the identity provider; falls back to QUILL_TOKEN.
    #[clap(long)]
    token: Option<String>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
enum Command {
    List {
        #[clap(long)]
        query: Option<String>,
    },
    Get {
        id: Uuid,
    },
    Create {
        #[clap(long)]
        title: String,
        #[clap(long)]
        content: String,
        #[clap(long)]
        video_url: Option<String>,
        /// Local image to attach; uploaded before the post is submitted.
        #[clap(long)]
        image: Option<PathBuf>,
        /// Save as an unpublished draft.
        #[clap(long)]
        draft: bool,
    },
    Update {
        id: Uuid,
        #[clap(long)]
        title: Option<String>,
        #[clap(long)]
        content: Option<String>,
        #[clap(long)]
        published: Option<bool>,
        #[clap(long)]
        video_url: Option<String>,
        #[clap(long)]
        image: Option<PathBuf>,
        /// Remove the post's image.
        #[clap(long, conflicts_with = "image")]
        clear_image: bool,
    },
    Delete {
        id: Uuid,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();

    let endpoint = args.server.as_deref().unwrap_or("http://127.0.0.1:8080");
    let token = args.token.or_else(|| std::env::var("QUILL_TOKEN").ok());
    let api = HttpPostApi::new(endpoint, token);

    match args.command {
        Command::List { query } => {
            let posts = api.list_posts(query.as_deref()).await?;
            println!("Posts ({})", posts.len());
            for post in posts {
                println!("- [{}] {} (by {})", post.id, post.title, post.author.name);
            }
        }
        Command::Get { id } => {
            let post = api.get_post(id).await?;
            println!("{} (by {}, published: {})", post.title, post.author.name, post.published);
            if let Some(video) = &post.video_url {
                println!("video: {}", video);
            }
            if let Some(image) = &post.image_url {
                println!("image: {}", image);
            }
            println!("{}", post.content);
        }
        Command::Create {
            title,
            content,
            video_url,
            image,
            draft,
        } => {
            let mut form = PostForm::new();
            form.set_title(title);
            form.set_content(content);
            form.set_published(!draft);
            if let Some(video_url) = video_url {
                form.set_video_url(video_url);
            }
            if let Some(path) = image {
                form.select_image(read_image(&path)?);
                let url = form.upload_image(&api).await?;
                println!("Image uploaded: {}", url);
            }
            let post = form.submit(&api, SubmitTarget::Create).await?;
            println!("Post created! ID: {}", post.id);
        }
        Command::Update {
            id,
            title,
            content,
            published,
            video_url,
            image,
            clear_image,
        } => {
            let current = api.get_post(id).await?;
            let mut form = PostForm::edit(&current);
            if let Some(title) = title {
                form.set_title(title);
            }
            if let Some(content) = content {
                form.set_content(content);
            }
            if let Some(published) = published {
                form.set_published(published);
            }
            if let Some(video_url) = video_url {
                form.set_video_url(video_url);
            }
            if clear_image {
                form.clear_image();
            }
            if let Some(path) = image {
                form.select_image(read_image(&path)?);
                let url = form.upload_image(&api).await?;
                println!("Image uploaded: {}", url);
            }
            let post = form.submit(&api, SubmitTarget::Update(id)).await?;
            println!("Post updated: {} ({})", post.title, post.id);
        }
        Command::Delete { id } => {
            api.delete_post(id).await?;
            println!("Post deleted!");
        }
    }

    Ok(())
}

fn read_image(path: &Path) -> Result<ImageFile, std::io::Error> {
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload.bin".to_string());
    let content_type = match path.extension().and_then(|e| e.to_str()) {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    };
    Ok(ImageFile {
        name,
        content_type: content_type.to_string(),
        bytes,
    })
}
