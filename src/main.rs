use estate_hub::adapters::{
    FilterExtractor, FloorPlanAnalyzer, GroqFilterExtractor, HuggingFaceStager, NewsSource,
    PhotonGeocoder, RoomKind, RssNewsSource, StagedImageSource, StagingGenerator, StagingRequest,
    StagingStyle, VisionFloorPlanAnalyzer,
};
use estate_hub::config::AppConfig;
use estate_hub::finance::{assess, calculate_emi, project, EligibilityInput, InvestmentInput};
use estate_hub::listings::{ListingSource, SampleListingSource};
use estate_hub::messaging::{MessageStore, ReplySettings};
use estate_hub::search::{apply_filters, SearchStore};
use estate_hub::storage::{JsonFileStore, KeyValueStore};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEMO_QUERY: &str = "2 BHK flat in Powai under 1.5 crore";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();
    info!("🏠 Estate Hub");
    info!("Data directory: {}", config.data_dir.display());

    let persistence: Arc<dyn KeyValueStore> =
        Arc::new(JsonFileStore::new(config.data_dir.clone())?);
    let messages = MessageStore::new(persistence.clone(), ReplySettings::from_config(&config));
    let searches = SearchStore::new(persistence);

    // Search
    let source = SampleListingSource;
    let listings = source.fetch().await?;
    info!("Fetched {} listings from {}", listings.len(), source.source_name());

    let extractor = GroqFilterExtractor::new(config.api_keys.groq.clone(), config.http_timeout)?;
    let extracted = extractor.extract(DEMO_QUERY).await;
    info!("🔍 \"{}\" parsed via {:?}", DEMO_QUERY, extracted.source);
    searches.add_recent_search(DEMO_QUERY, extracted.filters.clone());

    let results = apply_filters(&listings, "", &extracted.filters);
    println!("\n{} matching listings:", results.len());
    for property in &results {
        println!(
            "  {} | {} BHK | ₹{} | {}, {}",
            property.title,
            property.bhk,
            property.price,
            property.location.locality,
            property.location.city
        );
    }
    let Some(chosen) = results.first().copied().or_else(|| listings.first()) else {
        return Ok(());
    };
    searches.add_viewed_property(&chosen.id);

    // Messaging
    let conversation_id = messages.start_conversation(
        &chosen.seller_id,
        &chosen.seller_name,
        &chosen.id,
        &chosen.title,
        chosen.cover_image(),
    );
    messages.send_message(&conversation_id, "Hi, what is the final price?");
    messages.close_chat();

    let mut updates = messages.subscribe();
    let wait_for = config.reply_delay_max + Duration::from_secs(1);
    let _ = tokio::time::timeout(wait_for, async {
        while messages.messages(&conversation_id).len() < 2 {
            if updates.changed().await.is_err() {
                break;
            }
        }
    })
    .await;

    println!("\nConversation with {}:", chosen.seller_name);
    let me = messages.user_id();
    for message in messages.messages(&conversation_id) {
        let who = if message.sender_id == me {
            "you"
        } else {
            chosen.seller_name.as_str()
        };
        println!("  [{}] {}", who, message.content);
    }
    println!("  unread: {}", messages.total_unread());
    messages.mark_as_read(&conversation_id);

    // Calculators
    let loan = chosen.price as f64 * 0.8;
    let emi = calculate_emi(loan, 8.5, 240)?;
    println!(
        "\nLoan ₹{:.0} at 8.5% for 20 years: EMI ₹{:.0}, total interest ₹{:.0}",
        loan, emi.emi, emi.total_interest
    );

    let eligibility = assess(&EligibilityInput {
        monthly_income: 150_000.0,
        existing_emi: 10_000.0,
        loan_amount: loan,
        annual_rate_pct: 8.5,
        tenure_years: 20,
    })?;
    println!(
        "FOIR {:.1}% ({}), max eligible loan ₹{:.0}",
        eligibility.foir_pct,
        if eligibility.is_eligible { "eligible" } else { "not eligible" },
        eligibility.max_eligible_loan
    );

    let investment = project(&InvestmentInput {
        purchase_price: chosen.price as f64,
        annual_appreciation_pct: 6.0,
        monthly_rent: 45_000.0,
        annual_rent_escalation_pct: 5.0,
        holding_years: 10,
    })?;
    println!(
        "10-year outlook: value ₹{:.0}, rental yield {:.2}%, ROI {:.1}%",
        investment.future_value, investment.gross_rental_yield_pct, investment.roi_pct
    );

    // AI adapters
    let analyzer =
        VisionFloorPlanAnalyzer::new(config.api_keys.google_vision.clone(), config.http_timeout)?;
    let plan = analyzer
        .analyze(&format!("https://images.estate-hub.example/{}/plan.jpg", chosen.id), chosen.bhk)
        .await;
    println!("\nFloor plan ({:?}, via {}):", plan.source, analyzer.source_name());
    for room in &plan.rooms {
        match room.dimensions {
            Some(d) => println!("  {} {:.0} x {:.0}", room.label, d.length, d.width),
            None => println!("  {}", room.label),
        }
    }

    let stager = HuggingFaceStager::new(config.api_keys.huggingface.clone(), config.http_timeout)?;
    let staged = stager
        .stage(&StagingRequest {
            room: RoomKind::LivingRoom,
            style: StagingStyle::Modern,
        })
        .await;
    match &staged.source {
        StagedImageSource::Generated { bytes, .. } => {
            let path = config.data_dir.join("staged.jpg");
            tokio::fs::write(&path, bytes).await?;
            info!("💾 Saved staged image to {}", path.display());
        }
        StagedImageSource::Stock { url } => println!("\nStaging preview: {}", url),
    }

    let geocoder = PhotonGeocoder::new(config.geocode_min_interval, config.http_timeout)?;
    match estate_hub::adapters::locate(&geocoder, &chosen.location.locality).await {
        Ok(points) => {
            if let Some(point) = points.first() {
                println!("{} → {:.4}, {:.4}", point.label, point.latitude, point.longitude);
            }
        }
        Err(notice) => println!("{}", notice.message),
    }

    let news = RssNewsSource::new(config.http_timeout)?;
    println!("\nMarket news:");
    for item in news.headlines(5).await {
        println!("  • {} ({})", item.title, item.publisher);
    }

    messages.shutdown();
    info!("✅ Done");
    Ok(())
}
