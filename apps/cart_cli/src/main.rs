use anyhow::{Context, Result};
use cart_core::{
    drawer::{CART_DRAWER, DRAWER_CLOSE, DRAWER_CONTENT, DRAWER_INNER, DRAWER_INNER_EMPTY, DRAWER_OVERLAY, HEADER_CART_ICON},
    load_settings, CartEngine, Document, FormOptions, ProductForm, SubmissionOutcome,
};
use clap::Parser;
use shared::domain::VariantId;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Args {
    /// Overrides the configured storefront.
    #[arg(long)]
    storefront_url: Option<String>,
    #[arg(long)]
    variant_id: i64,
    #[arg(long, default_value_t = 1)]
    quantity: u32,
    /// Page the cart sections are rendered against.
    #[arg(long)]
    path: Option<String>,
    /// Treat a rejection as sold out and keep the control disabled.
    #[arg(long)]
    sold_out_marker: bool,
}

/// Product page with an empty drawer, the header cart icon and a focused add button.
fn product_page() -> Document {
    let document = Document::new();
    document.insert(CART_DRAWER, "");
    document.toggle_class(CART_DRAWER, "is-empty", true);
    document.insert(DRAWER_CONTENT, "");
    document.insert(DRAWER_OVERLAY, "");
    document.insert(DRAWER_INNER, "");
    document.insert(DRAWER_INNER_EMPTY, "");
    document.insert(DRAWER_CLOSE, "");
    document.insert(HEADER_CART_ICON, "");
    let button = document.insert("#product-form-submit", "Add to cart");
    document.focus(button);
    document
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(url) = args.storefront_url {
        settings.storefront_url = url;
    }
    if let Some(path) = args.path {
        settings.page_path = path;
    }

    let document = product_page();
    let trigger = document.element_id("#product-form-submit");
    let options = FormOptions {
        sold_out_marker: args.sold_out_marker,
        ..FormOptions::default()
    };
    let engine = CartEngine::connect(&settings, document, options)
        .with_context(|| format!("cannot reach storefront at {}", settings.storefront_url))?;
    info!(storefront = %settings.storefront_url, variant_id = args.variant_id, "submitting add to cart");

    let form = ProductForm {
        trigger,
        ..ProductForm::new(VariantId(args.variant_id), args.quantity)
    };
    let outcome = engine
        .submissions
        .submit(form)
        .await
        .context("add to cart control is busy")?
        .await
        .context("submission task failed")?;

    match &outcome {
        SubmissionOutcome::Added { item_count } => println!("Added; cart now holds {item_count} item(s)"),
        SubmissionOutcome::Rejected { message, terminal } => {
            println!("Rejected: {message}{}", if *terminal { " (sold out)" } else { "" })
        }
        SubmissionOutcome::TransportFailed => println!("Storefront unreachable; cart left unchanged"),
    }
    match engine.badge.rendered_count() {
        Some(count) => println!("Badge: {count}"),
        None => println!("Badge: hidden"),
    }
    println!("Drawer: {:?}", engine.drawer.state());
    if let Some(content) = engine.document.markup(DRAWER_CONTENT) {
        println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "drawer_content": content }))?);
    }

    Ok(())
}
