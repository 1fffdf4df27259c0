//! Seed script for development: populates a fresh database with sample data.
//!
//! Usage: `cargo run --bin seed`
//!
//! Requires `DATABASE_URL` and `SESSION_SECRET` environment variables (reads .env).

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::{json, Value};
use wellness_admin::config::AppConfig;
use wellness_admin::db::{self, collections, DocumentStore, PgDocumentStore};
use wellness_admin::errors::AppError;
use wellness_admin::models::timestamp::iso_string;
use wellness_admin::services::identity::LocalIdentityProvider;

const ADMIN_UID: &str = "admin";
const ADMIN_EMAIL: &str = "admin@wellness.local";
const ADMIN_PASSWORD: &str = "Test123!";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;
    let pool = db::create_pool(&config.database_url, 5).await?;

    // Run migrations first
    db::migrate(&pool).await?;

    println!("=== Wellness Admin Seed Script ===");

    let store: Arc<dyn DocumentStore> = Arc::new(PgDocumentStore::new(pool));
    let identity = LocalIdentityProvider::new(
        store.clone(),
        config.session_secret.clone(),
        config.id_token_expiry_secs,
        config.password_reset_expiry_secs,
        config.app_url.clone(),
    );

    seed_admin(store.as_ref(), &identity).await?;
    seed_users(store.as_ref(), &identity).await?;
    seed_therapists(store.as_ref()).await?;
    seed_bookings(store.as_ref()).await?;
    seed_products(store.as_ref()).await?;
    seed_orders(store.as_ref()).await?;

    println!("\n=== Seed complete! ===");
    println!("Admin login: {ADMIN_EMAIL} / {ADMIN_PASSWORD}");

    Ok(())
}

async fn seed_admin(
    store: &dyn DocumentStore,
    identity: &LocalIdentityProvider,
) -> anyhow::Result<()> {
    match identity
        .create_account(Some(ADMIN_UID), ADMIN_EMAIL, ADMIN_PASSWORD)
        .await
    {
        Ok(_) => println!("[done] Created admin account"),
        Err(AppError::Conflict(_)) => println!("[skip] Admin account already exists"),
        Err(e) => return Err(e.into()),
    }

    store
        .put(
            collections::ADMINS,
            ADMIN_UID,
            json!({ "email": ADMIN_EMAIL, "name": "Platform Administrator" }),
        )
        .await?;
    println!("[done] Granted admin access to {ADMIN_EMAIL}");
    Ok(())
}

async fn seed_users(
    store: &dyn DocumentStore,
    identity: &LocalIdentityProvider,
) -> anyhow::Result<()> {
    let now = Utc::now();
    let users = [
        ("user-ananya", "Ananya", "Sharma", "ananya@example.com", "Mumbai", 2),
        ("user-rohan", "Rohan", "Mehta", "rohan@example.com", "Pune", 20),
        ("user-kavya", "Kavya", "Iyer", "kavya@example.com", "Chennai", 45),
        ("user-arjun", "Arjun", "Nair", "arjun@example.com", "Kochi", 70),
    ];

    for (uid, first, last, email, city, days_ago) in users {
        match identity.create_account(Some(uid), email, "Welcome123!").await {
            Ok(_) | Err(AppError::Conflict(_)) => {}
            Err(e) => return Err(e.into()),
        }
        let joined = iso_string(now - Duration::days(days_ago));
        store
            .put(
                collections::USERS,
                uid,
                json!({
                    "firstName": first,
                    "lastName": last,
                    "email": email,
                    "city": city,
                    "onboardingCompleted": true,
                    "createdAt": joined,
                    "updatedAt": joined,
                }),
            )
            .await?;
    }
    println!("[done] Seeded {} users", users.len());
    Ok(())
}

async fn seed_therapists(store: &dyn DocumentStore) -> anyhow::Result<()> {
    let now = Utc::now();
    let therapists: [(&str, &str, bool, &[&str], Value); 3] = [
        (
            "therapist-rao",
            "Dr. Meera Rao",
            true,
            &["Anxiety", "Depression"],
            json!([{
                "id": "review-1",
                "reviewerName": "Ananya",
                "rating": 5,
                "comment": "Very calm and supportive.",
                "date": iso_string(now - Duration::days(3)),
                "isVerified": true,
                "helpfulCount": 2,
                "flagged": false,
            }]),
        ),
        (
            "therapist-khan",
            "Dr. Imran Khan",
            true,
            &["Relationships"],
            json!([{
                "id": "review-2",
                "reviewerName": "Rohan",
                "rating": 4,
                "comment": "Helpful sessions.",
                "date": iso_string(now - Duration::days(10)),
                "isVerified": false,
                "helpfulCount": 0,
                "flagged": false,
            }]),
        ),
        ("therapist-das", "Priya Das", false, &["Sleep", "Stress"], json!([])),
    ];

    for (id, name, verified, specializations, reviews) in &therapists {
        let count = reviews.as_array().map_or(0, Vec::len);
        store
            .put(
                collections::THERAPISTS,
                id,
                json!({
                    "name": name,
                    "verified": verified,
                    "specializations": specializations,
                    "experience": 6,
                    "ratings": 4.5,
                    "reviews": reviews,
                    "reviewsCount": count,
                    "createdAt": iso_string(now - Duration::days(90)),
                }),
            )
            .await?;
    }
    println!("[done] Seeded {} therapists", therapists.len());
    Ok(())
}

async fn seed_bookings(store: &dyn DocumentStore) -> anyhow::Result<()> {
    let now = Utc::now();
    let bookings = [
        ("booking-1", "user-ananya", "therapist-rao", "Dr. Meera Rao", "Individual", 1, 1500.0, "completed"),
        ("booking-2", "user-rohan", "therapist-khan", "Dr. Imran Khan", "Couple", 4, 2500.0, "completed"),
        ("booking-3", "user-kavya", "therapist-rao", "Dr. Meera Rao", "Individual", 12, 1500.0, "confirmed"),
        ("booking-4", "user-arjun", "therapist-khan", "Dr. Imran Khan", "Group", 35, 800.0, "completed"),
        ("booking-5", "user-ananya", "therapist-das", "Priya Das", "Individual", -3, 1200.0, "pending"),
        ("booking-6", "user-rohan", "therapist-rao", "Dr. Meera Rao", "Individual", 50, 1500.0, "cancelled"),
    ];

    for (id, user_id, therapist_id, therapist_name, session_type, days_ago, amount, status) in bookings {
        store
            .put(
                collections::BOOKINGS,
                id,
                json!({
                    "userId": user_id,
                    "therapistId": therapist_id,
                    "therapistName": therapist_name,
                    "sessionType": session_type,
                    "date": iso_string(now - Duration::days(days_ago)),
                    "timeSlot": "10:00 AM",
                    "amount": amount,
                    "status": status,
                }),
            )
            .await?;
    }
    println!("[done] Seeded {} bookings", bookings.len());
    Ok(())
}

async fn seed_products(store: &dyn DocumentStore) -> anyhow::Result<()> {
    let products = [
        ("product-journal", "Gratitude Journal", "mind", 499.0, 40),
        ("product-mat", "Yoga Mat", "body", 1299.0, 15),
        ("product-mask", "Silk Sleep Mask", "sleep", 699.0, 25),
    ];

    for (id, name, category, price, stock) in products {
        store
            .put(
                collections::PRODUCTS,
                id,
                json!({
                    "name": name,
                    "description": format!("{name} for everyday wellbeing."),
                    "category": category,
                    "price": price,
                    "stock": stock,
                    "rating": 4.6,
                    "reviewCount": 0,
                    "isTherapistRecommended": category == "mind",
                    "tags": [category],
                }),
            )
            .await?;
    }
    println!("[done] Seeded {} products", products.len());
    Ok(())
}

async fn seed_orders(store: &dyn DocumentStore) -> anyhow::Result<()> {
    let now = Utc::now();
    let orders = [
        ("order-1", "Gratitude Journal", 2.0, 998.0, 2, "delivered"),
        ("order-2", "Yoga Mat", 1.0, 1299.0, 15, "shipped"),
        ("order-3", "Silk Sleep Mask", 1.0, 699.0, 40, "processing"),
    ];

    for (id, product, quantity, total, days_ago, status) in orders {
        store
            .put(
                collections::ORDERS,
                id,
                json!({
                    "items": [{ "productName": product, "quantity": quantity }],
                    "subtotal": total,
                    "discount": 0,
                    "tax": 0,
                    "total": total,
                    "status": status,
                    "createdAt": iso_string(now - Duration::days(days_ago)),
                }),
            )
            .await?;
    }
    println!("[done] Seeded {} orders", orders.len());
    Ok(())
}
