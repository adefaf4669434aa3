use crate::errors::Result;
use crate::models::{to_money, Product, ProductRow};
use sqlx::{Executor, QueryBuilder, Sqlite};

const PRODUCT_COLUMNS: &str = "id, name, category, price, description, image, stock";

/// Returns the number of rows inserted (0 when the id already exists).
pub async fn insert_if_absent<'e, E>(executor: E, product: &Product) -> Result<u64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO products (id, name, category, price, description, image, stock)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(product.id)
    .bind(&product.name)
    .bind(&product.category)
    .bind(to_money(product.price).to_string())
    .bind(&product.description)
    .bind(&product.image)
    .bind(product.stock)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

pub async fn upsert<'e, E>(executor: E, product: &Product) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO products (id, name, category, price, description, image, stock)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT (id) DO UPDATE SET
            name = excluded.name,
            category = excluded.category,
            price = excluded.price,
            description = excluded.description,
            image = excluded.image,
            stock = excluded.stock
        "#,
    )
    .bind(product.id)
    .bind(&product.name)
    .bind(&product.category)
    .bind(to_money(product.price).to_string())
    .bind(&product.description)
    .bind(&product.image)
    .bind(product.stock)
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn list_all<'e, E>(executor: E) -> Result<Vec<Product>>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {} FROM products ORDER BY id",
        PRODUCT_COLUMNS
    ))
    .fetch_all(executor)
    .await?
    .into_iter()
    .map(Product::try_from)
    .collect()
}

/// Load the given products; ids with no catalog entry are simply absent.
pub async fn find_many<'e, E>(executor: E, ids: &[i64]) -> Result<Vec<Product>>
where
    E: Executor<'e, Database = Sqlite>,
{
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder: QueryBuilder<'_, Sqlite> =
        QueryBuilder::new(format!("SELECT {} FROM products WHERE id IN (", PRODUCT_COLUMNS));
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")");

    builder
        .build_query_as::<ProductRow>()
        .fetch_all(executor)
        .await?
        .into_iter()
        .map(Product::try_from)
        .collect()
}
