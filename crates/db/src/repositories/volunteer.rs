use crate::models::{DbCertification, DbOrganization, DbVolunteer};
use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

pub async fn create_organization(pool: &Pool<Postgres>, name: &str) -> Result<DbOrganization> {
    let id = Uuid::new_v4();

    let organization = sqlx::query_as::<_, DbOrganization>(
        r#"
        INSERT INTO organizations (id, name)
        VALUES ($1, $2)
        RETURNING id, name
        "#,
    )
    .bind(id)
    .bind(name)
    .fetch_one(pool)
    .await?;

    Ok(organization)
}

pub async fn get_organization_by_id(
    pool: &Pool<Postgres>,
    id: Uuid,
) -> Result<Option<DbOrganization>> {
    let organization = sqlx::query_as::<_, DbOrganization>(
        r#"
        SELECT id, name
        FROM organizations
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(organization)
}

pub async fn create_volunteer(
    pool: &Pool<Postgres>,
    fiscal_code: &str,
    first_name: &str,
    last_name: &str,
    organization_id: Option<Uuid>,
) -> Result<DbVolunteer> {
    tracing::debug!("Creating volunteer: fiscal_code={}", fiscal_code);

    let volunteer = sqlx::query_as::<_, DbVolunteer>(
        r#"
        INSERT INTO volunteers (fiscal_code, first_name, last_name, organization_id)
        VALUES ($1, $2, $3, $4)
        RETURNING fiscal_code, first_name, last_name, organization_id, is_staff
        "#,
    )
    .bind(fiscal_code)
    .bind(first_name)
    .bind(last_name)
    .bind(organization_id)
    .fetch_one(pool)
    .await?;

    Ok(volunteer)
}

pub async fn get_volunteer_by_fiscal_code(
    pool: &Pool<Postgres>,
    fiscal_code: &str,
) -> Result<Option<DbVolunteer>> {
    let volunteer = sqlx::query_as::<_, DbVolunteer>(
        r#"
        SELECT fiscal_code, first_name, last_name, organization_id, is_staff
        FROM volunteers
        WHERE fiscal_code = $1
        "#,
    )
    .bind(fiscal_code)
    .fetch_optional(pool)
    .await?;

    Ok(volunteer)
}

pub async fn add_certification(
    pool: &Pool<Postgres>,
    fiscal_code: &str,
    name: &str,
    expires_at: Option<chrono::DateTime<chrono::Utc>>,
) -> Result<DbCertification> {
    let certification = sqlx::query_as::<_, DbCertification>(
        r#"
        INSERT INTO certifications (id, volunteer_fiscal_code, name, expires_at)
        VALUES ($1, $2, $3, $4)
        RETURNING id, volunteer_fiscal_code, name, expires_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(fiscal_code)
    .bind(name)
    .bind(expires_at)
    .fetch_one(pool)
    .await?;

    Ok(certification)
}

pub async fn get_certifications(
    pool: &Pool<Postgres>,
    fiscal_code: &str,
) -> Result<Vec<DbCertification>> {
    let certifications = sqlx::query_as::<_, DbCertification>(
        r#"
        SELECT id, volunteer_fiscal_code, name, expires_at
        FROM certifications
        WHERE volunteer_fiscal_code = $1
        ORDER BY name
        "#,
    )
    .bind(fiscal_code)
    .fetch_all(pool)
    .await?;

    Ok(certifications)
}
