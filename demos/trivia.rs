//! Trivia lookup against a jService-style API.
//!
//! This example shows how to:
//! - Declare descriptors for each endpoint of an API
//! - Resolve all declarations at startup
//! - Route client hooks into `tracing`
//!
//! Run with: `TRIVIA_API_URI=https://jservice.example.com/api cargo run --example trivia`

use chrono::NaiveDate;
use restmap::metadata::{DescriptorMetadata, FieldValues, MetadataBuilder};
use restmap::{Client, Descriptor, Error, Verb};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Category {
    id: u32,
    title: String,
    clues_count: u32,
    #[serde(default)]
    clues: Vec<Clue>,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Clue {
    id: u32,
    answer: String,
    question: String,
    value: Option<u32>,
    airdate: String,
    category_id: u32,
    game_id: Option<u32>,
    category: Option<Box<Category>>,
}

/// Random clues; the API caps `count` at 100.
struct GetRandom {
    count: Option<u32>,
}

impl Descriptor for GetRandom {
    type Response = Vec<Clue>;

    fn declare() -> MetadataBuilder {
        DescriptorMetadata::builder()
            .route("/random")
            .verb(Verb::Get)
            .field("Count")
    }

    fn write_fields(&self, fields: &mut FieldValues) -> restmap::Result<()> {
        fields.set("Count", &self.count)?;
        Ok(())
    }
}

/// Clues filtered by dollar value, category and original air date.
#[derive(Default)]
#[allow(dead_code)]
struct GetClues {
    value: Option<u32>,
    category: Option<u32>,
    min_date: Option<NaiveDate>,
    max_date: Option<NaiveDate>,
    offset: Option<u32>,
}

impl Descriptor for GetClues {
    type Response = Vec<Clue>;

    fn declare() -> MetadataBuilder {
        DescriptorMetadata::builder()
            .route("/clues")
            .verb(Verb::Get)
            .field("Value")
            .field("Category")
            .field("MinDate")
            .field("MaxDate")
            .field("Offset")
    }

    fn write_fields(&self, fields: &mut FieldValues) -> restmap::Result<()> {
        fields
            .set("Value", &self.value)?
            .set("Category", &self.category)?
            .set("MinDate", &self.min_date)?
            .set("MaxDate", &self.max_date)?
            .set("Offset", &self.offset)?;
        Ok(())
    }
}

/// Final Jeopardy clues.
struct GetFinal {
    count: Option<u32>,
}

impl Descriptor for GetFinal {
    type Response = Vec<Clue>;

    fn declare() -> MetadataBuilder {
        DescriptorMetadata::builder()
            .route("/final")
            .verb(Verb::Get)
            .field("Count")
    }

    fn write_fields(&self, fields: &mut FieldValues) -> restmap::Result<()> {
        fields.set("Count", &self.count)?;
        Ok(())
    }
}

struct GetCategories {
    count: Option<u32>,
    offset: Option<u32>,
}

impl Descriptor for GetCategories {
    type Response = Vec<Category>;

    fn declare() -> MetadataBuilder {
        DescriptorMetadata::builder()
            .route("/categories")
            .verb(Verb::Get)
            .field("Count")
            .field("Offset")
    }

    fn write_fields(&self, fields: &mut FieldValues) -> restmap::Result<()> {
        fields
            .set("Count", &self.count)?
            .set("Offset", &self.offset)?;
        Ok(())
    }
}

/// One category with all of its clues. `id` is required by the API.
struct GetCategory {
    id: Option<u32>,
}

impl Descriptor for GetCategory {
    type Response = Category;

    fn declare() -> MetadataBuilder {
        DescriptorMetadata::builder()
            .route("/category")
            .verb(Verb::Get)
            .field("Id")
    }

    fn write_fields(&self, fields: &mut FieldValues) -> restmap::Result<()> {
        fields.set("Id", &self.id)?;
        Ok(())
    }
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("restmap=debug,trivia=info")
        .init();

    let base_url = std::env::var("TRIVIA_API_URI")
        .unwrap_or_else(|_| "https://jservice.example.com/api".to_string());

    let client = Client::builder()
        .base_url(&base_url)?
        .on_request(|request| {
            tracing::info!(method = %request.method, url = %request.url, "Sending request");
        })
        .on_error(|request, response, error| {
            tracing::error!(
                url = %request.url,
                status = response.map(|r| r.status.as_u16()),
                error = %error,
                "Trivia request failed"
            );
        })
        .build()?;

    client.metadata::<GetRandom>()?;
    client.metadata::<GetClues>()?;
    client.metadata::<GetFinal>()?;
    client.metadata::<GetCategories>()?;
    client.metadata::<GetCategory>()?;

    println!("=== Random Clue ===");
    match client.invoke(&GetRandom { count: Some(1) })?.and_then(|c| c.into_iter().next()) {
        Some(clue) => println!("{}|{}", clue.question, clue.answer),
        None => println!("No clue available"),
    }
    println!();

    println!("=== $400 Clues From 1999 ===");
    let clues = client
        .invoke(&GetClues {
            value: Some(400),
            min_date: NaiveDate::from_ymd_opt(1999, 1, 1),
            max_date: NaiveDate::from_ymd_opt(1999, 12, 31),
            ..GetClues::default()
        })?
        .unwrap_or_default();
    for clue in clues.iter().take(5) {
        println!("{}|{}", clue.question, clue.answer);
    }
    println!();

    println!("=== Final Jeopardy ===");
    if let Some(clue) = client
        .invoke(&GetFinal { count: Some(1) })?
        .and_then(|c| c.into_iter().next())
    {
        println!("{}|{}", clue.question, clue.answer);
    }
    println!();

    println!("=== Categories ===");
    let categories = client
        .invoke(&GetCategories {
            count: Some(5),
            offset: None,
        })?
        .unwrap_or_default();
    for category in &categories {
        println!("{} ({} clues)", category.title, category.clues_count);
    }

    if let Some(first) = categories.first() {
        if let Some(category) = client.invoke(&GetCategory { id: Some(first.id) })? {
            println!("{} has {} clues loaded", category.title, category.clues.len());
        }
    }

    Ok(())
}
