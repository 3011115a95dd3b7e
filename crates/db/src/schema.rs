use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    // Create organizations table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS organizations (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            name VARCHAR(150) NOT NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create volunteers table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS volunteers (
            fiscal_code VARCHAR(16) PRIMARY KEY,
            first_name VARCHAR(64) NOT NULL,
            last_name VARCHAR(64) NOT NULL,
            organization_id UUID REFERENCES organizations(id) ON DELETE SET NULL,
            is_staff BOOLEAN NOT NULL DEFAULT FALSE
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create certifications table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS certifications (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            volunteer_fiscal_code VARCHAR(16) NOT NULL
                REFERENCES volunteers(fiscal_code) ON DELETE CASCADE,
            name VARCHAR(150) NOT NULL,
            expires_at TIMESTAMP WITH TIME ZONE NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create service_types table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS service_types (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            name VARCHAR(150) NOT NULL UNIQUE
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create checklist_template_items table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS checklist_template_items (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            service_type_id UUID NOT NULL
                REFERENCES service_types(id) ON DELETE CASCADE,
            description VARCHAR(300) NOT NULL,
            position INTEGER NOT NULL DEFAULT 0
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create services table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS services (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            name VARCHAR(150) NOT NULL,
            starts_at TIMESTAMP WITH TIME ZONE NOT NULL,
            service_type_id UUID REFERENCES service_types(id) ON DELETE RESTRICT,
            poll_id VARCHAR(100) NULL UNIQUE,
            poll_message_id BIGINT NULL,
            send_message BOOLEAN NOT NULL DEFAULT TRUE,
            poll_closed BOOLEAN NOT NULL DEFAULT FALSE,
            notification_sent BOOLEAN NOT NULL DEFAULT FALSE
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create availability_entries table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS availability_entries (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            volunteer_fiscal_code VARCHAR(16) NOT NULL
                REFERENCES volunteers(fiscal_code) ON DELETE CASCADE,
            service_id UUID NOT NULL REFERENCES services(id) ON DELETE CASCADE,
            answer VARCHAR(10) NULL,
            answered_at TIMESTAMP WITH TIME ZONE NULL,
            UNIQUE (volunteer_fiscal_code, service_id)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create scheduled_tasks table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS scheduled_tasks (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            name VARCHAR(150) NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            service_type_id UUID REFERENCES service_types(id) ON DELETE RESTRICT,
            deadline TIMESTAMP WITH TIME ZONE NOT NULL,
            notification_sent BOOLEAN NOT NULL DEFAULT FALSE,
            completed BOOLEAN NOT NULL DEFAULT FALSE,
            completed_at TIMESTAMP WITH TIME ZONE NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create task_assignments table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS task_assignments (
            task_id UUID NOT NULL REFERENCES scheduled_tasks(id) ON DELETE CASCADE,
            volunteer_fiscal_code VARCHAR(16) NOT NULL
                REFERENCES volunteers(fiscal_code) ON DELETE CASCADE,
            PRIMARY KEY (task_id, volunteer_fiscal_code)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create checklist_items table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS checklist_items (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            task_id UUID NOT NULL REFERENCES scheduled_tasks(id) ON DELETE CASCADE,
            description VARCHAR(300) NOT NULL,
            position INTEGER NOT NULL DEFAULT 0,
            done BOOLEAN NOT NULL DEFAULT FALSE,
            done_by VARCHAR(16) REFERENCES volunteers(fiscal_code) ON DELETE SET NULL,
            done_at TIMESTAMP WITH TIME ZONE NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create time_entries table. A row may link to a service or to a
    // scheduled task, never both.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS time_entries (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            volunteer_fiscal_code VARCHAR(16) NOT NULL
                REFERENCES volunteers(fiscal_code) ON DELETE CASCADE,
            clock_in TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            clock_out TIMESTAMP WITH TIME ZONE NULL,
            notes TEXT NOT NULL DEFAULT '',
            service_id UUID REFERENCES services(id) ON DELETE RESTRICT,
            task_id UUID REFERENCES scheduled_tasks(id) ON DELETE RESTRICT,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT time_entry_single_link
                CHECK (NOT (service_id IS NOT NULL AND task_id IS NOT NULL))
        );
        "#,
    )
    .execute(pool)
    .await?;

    // At most one open entry per volunteer, enforced by the database so
    // concurrent clock-ins cannot slip through.
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_time_entries_one_open
            ON time_entries (volunteer_fiscal_code)
            WHERE clock_out IS NULL;
        "#,
    )
    .execute(pool)
    .await?;

    // Create telegram_accounts table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS telegram_accounts (
            telegram_id BIGINT PRIMARY KEY,
            chat_id BIGINT NOT NULL,
            volunteer_fiscal_code VARCHAR(16) NULL UNIQUE
                REFERENCES volunteers(fiscal_code) ON DELETE CASCADE,
            username VARCHAR(32) NULL,
            first_name VARCHAR(64) NULL,
            last_name VARCHAR(64) NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create login_tokens table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS login_tokens (
            token VARCHAR(64) PRIMARY KEY,
            telegram_id BIGINT NOT NULL
                REFERENCES telegram_accounts(telegram_id) ON DELETE CASCADE,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            used_at TIMESTAMP WITH TIME ZONE NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create web_login_requests table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS web_login_requests (
            token VARCHAR(64) PRIMARY KEY,
            volunteer_fiscal_code VARCHAR(16) NOT NULL
                REFERENCES volunteers(fiscal_code) ON DELETE CASCADE,
            status VARCHAR(10) NOT NULL DEFAULT 'pending',
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            resolved_at TIMESTAMP WITH TIME ZONE NULL
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes
    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_services_starts_at ON services(starts_at)",
        "CREATE INDEX IF NOT EXISTS idx_availability_entries_service_id ON availability_entries(service_id)",
        "CREATE INDEX IF NOT EXISTS idx_scheduled_tasks_deadline ON scheduled_tasks(deadline)",
        "CREATE INDEX IF NOT EXISTS idx_checklist_items_task_id ON checklist_items(task_id)",
        "CREATE INDEX IF NOT EXISTS idx_time_entries_volunteer ON time_entries(volunteer_fiscal_code)",
        "CREATE INDEX IF NOT EXISTS idx_time_entries_task_id ON time_entries(task_id)",
        "CREATE INDEX IF NOT EXISTS idx_certifications_volunteer ON certifications(volunteer_fiscal_code)",
    ];
    for index in indexes {
        sqlx::query(index).execute(pool).await?;
    }

    info!("Database schema initialized successfully.");
    Ok(())
}
