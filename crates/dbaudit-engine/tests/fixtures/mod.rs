//! Test fixtures for rule engine integration tests
//!
//! A small e-commerce database with a few known problems:
//! - `audit_logs` has no primary key and no index
//! - `orders.user_id` is not declared as a relation
//! - `orders.coupon_id` references a dropped `coupons` table
//! - `order_items.product_id` is a bigint referencing an int
//! - `order_items` relations have no index
//! - query `1` got much slower since the previous snapshot

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use dbaudit_core::{
    AnalyzeHistory, Attribute, Database, DatabaseQuery, Entity, EntityRef, Index, QueryStats, Relation,
    RelationOrigin,
};

pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
}

fn path(name: &str) -> Vec<String> {
    vec![name.to_string()]
}

fn fk(src: &str, attr: &str, reference: &str) -> Relation {
    Relation::new(EntityRef::new(src), path(attr), EntityRef::new(reference), path("id")).with_origin(RelationOrigin::Fk)
}

/// Users, orders, products and their links
pub fn shop_database() -> Database {
    Database {
        entities: vec![
            Entity::new(
                "users",
                vec![
                    Attribute::new("id", "int"),
                    Attribute::new("email", "varchar(255)"),
                    Attribute::new("created_at", "timestamptz"),
                ],
            )
            .with_pk(vec![path("id")])
            .with_index(Index::new(Some("users_email_idx"), vec![path("email")]).unique()),
            Entity::new(
                "orders",
                vec![
                    Attribute::new("id", "int"),
                    Attribute::new("user_id", "int"),
                    Attribute::new("coupon_id", "int"),
                    Attribute::new("status", "varchar"),
                ],
            )
            .with_pk(vec![path("id")])
            .with_index(Index::new(Some("orders_user_idx"), vec![path("user_id")]))
            .with_index(Index::new(Some("orders_coupon_idx"), vec![path("coupon_id")])),
            Entity::new(
                "order_items",
                vec![
                    Attribute::new("id", "int"),
                    Attribute::new("order_id", "int"),
                    Attribute::new("product_id", "bigint"),
                    Attribute::new("quantity", "int"),
                ],
            )
            .with_pk(vec![path("id")]),
            Entity::new("products", vec![Attribute::new("id", "int"), Attribute::new("name", "varchar")])
                .with_pk(vec![path("id")]),
            Entity::new("audit_logs", vec![Attribute::new("created_at", "timestamptz"), Attribute::new("payload", "jsonb")]),
        ],
        relations: vec![
            fk("order_items", "order_id", "orders"),
            fk("order_items", "product_id", "products"),
            fk("orders", "coupon_id", "coupons"),
        ],
        ..Default::default()
    }
}

fn exec(count: u64, mean_time: f64) -> QueryStats {
    QueryStats {
        count,
        min_time: mean_time / 2.0,
        max_time: mean_time * 2.0,
        sum_time: count as f64 * mean_time,
        mean_time,
        sd_time: mean_time / 10.0,
    }
}

pub fn shop_queries() -> Vec<DatabaseQuery> {
    vec![
        DatabaseQuery::new("1", "SELECT * FROM orders WHERE user_id = $1").with_exec(exec(120, 2500.0)),
        DatabaseQuery::new("2", "SELECT id, email FROM users WHERE email = $1").with_exec(exec(4000, 0.4)),
    ]
}

/// One snapshot, 10 days before `now`
pub fn shop_history() -> Vec<AnalyzeHistory> {
    let queries = vec![
        DatabaseQuery::new("1", "SELECT * FROM orders WHERE user_id = $1").with_exec(exec(40, 100.0)),
        DatabaseQuery::new("2", "SELECT id, email FROM users WHERE email = $1").with_exec(exec(1000, 0.4)),
    ];
    vec![AnalyzeHistory::new("report_2024-05-22.json", now() - Duration::days(10), shop_database()).with_queries(queries)]
}
