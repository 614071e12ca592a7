use memsearch::{
    Document, FieldType, OrderBy, SearchField, SearchIndex, SearchOptions, SearchService,
};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memsearch=debug".into()),
        )
        .init();

    let service = SearchService::new();
    service.start_up()?;

    service.create_index_if_not_exists(SearchIndex::new(
        "listings",
        vec![
            SearchField::key("id"),
            SearchField::new("title", FieldType::String).searchable(),
            SearchField::new("category", FieldType::String)
                .filterable()
                .facetable(),
            SearchField::new("price", FieldType::Integer)
                .filterable()
                .sortable(),
        ],
    ))?;

    println!("Indexing documents...");
    for (id, title, category, price) in [
        ("1", "Mountain Bike", "Sports", 500),
        ("2", "Electric Scooter", "Sports", 200),
        ("3", "Bike Helmet", "Safety", 50),
    ] {
        service.index_document(
            "listings",
            Document::new()
                .with_field("id", id)
                .with_field("title", title)
                .with_field("category", category)
                .with_field("price", price),
        )?;
    }

    println!("\n--- Text query: 'bike' ---");
    let result = service.search("listings", "bike", &SearchOptions::default())?;
    for hit in &result.results {
        println!(
            "  [{:.4}] {:?}",
            hit.score,
            hit.document.get("title").unwrap()
        );
    }

    println!("\n--- Filter: price gt 100 and category eq 'Sports' ---");
    let options = SearchOptions::default().with_filter("price gt 100 and category eq 'Sports'");
    let result = service.search("listings", "*", &options)?;
    for hit in &result.results {
        println!("  {:?}", hit.document.get("title").unwrap());
    }

    println!("\n--- Sorted by price, faceted by category ---");
    let options = SearchOptions::default()
        .with_order_by(OrderBy::asc("price"))
        .with_facet("category")
        .with_total_count();
    let result = service.search("listings", "", &options)?;
    for hit in &result.results {
        println!(
            "  {:?} at {:?}",
            hit.document.get("title").unwrap(),
            hit.document.get("price").unwrap()
        );
    }
    println!("  total: {:?}", result.count);
    for (field, buckets) in &result.facets {
        for bucket in buckets {
            println!("  facet {}={} -> {}", field, bucket.value, bucket.count);
        }
    }

    service.shut_down()?;
    Ok(())
}
