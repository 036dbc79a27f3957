use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_products_table::Migration),
            Box::new(m20240101_000002_create_patients_physicians_tables::Migration),
            Box::new(m20240101_000003_create_prescriptions_tables::Migration),
            Box::new(m20240101_000004_create_dispensals_tables::Migration),
            Box::new(m20240101_000005_create_balance_transactions_table::Migration),
            Box::new(m20240101_000006_create_stock_movements_table::Migration),
            Box::new(m20240101_000007_create_users_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_products_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_products_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            // Create products table aligned with entities::product Model
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Products::Code).string().not_null())
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::GenericName).string().null())
                        .col(ColumnDef::new(Products::BrandName).string().null())
                        .col(ColumnDef::new(Products::Category).string().not_null())
                        .col(
                            ColumnDef::new(Products::Quantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Products::ReorderLevel).integer().null())
                        .col(
                            ColumnDef::new(Products::Price)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Products::ExpiryDate).date().null())
                        .col(ColumnDef::new(Products::BatchNumber).string().null())
                        .col(ColumnDef::new(Products::Unit).string().not_null())
                        .col(
                            ColumnDef::new(Products::PrescriptionRequired)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Products::IsDeleted)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Products::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Products::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            // Code collisions are checked application-side (soft-deleted rows
            // may legitimately share a code), so this index is not unique.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_code")
                        .table(Products::Table)
                        .col(Products::Code)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_category")
                        .table(Products::Table)
                        .col(Products::Category)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_created_at")
                        .table(Products::Table)
                        .col(Products::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Products {
        Table,
        Id,
        Code,
        Name,
        GenericName,
        BrandName,
        Category,
        Quantity,
        ReorderLevel,
        Price,
        ExpiryDate,
        BatchNumber,
        Unit,
        PrescriptionRequired,
        IsDeleted,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_patients_physicians_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_patients_physicians_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Patients::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Patients::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Patients::FirstName).string().not_null())
                        .col(ColumnDef::new(Patients::LastName).string().not_null())
                        .col(ColumnDef::new(Patients::Phone).string().null())
                        .col(
                            ColumnDef::new(Patients::IsDeleted)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Patients::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Patients::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Physicians::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Physicians::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Physicians::FirstName).string().not_null())
                        .col(ColumnDef::new(Physicians::LastName).string().not_null())
                        .col(ColumnDef::new(Physicians::Specialty).string().null())
                        .col(
                            ColumnDef::new(Physicians::IsDeleted)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Physicians::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Physicians::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Physicians::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Patients::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Patients {
        Table,
        Id,
        FirstName,
        LastName,
        Phone,
        IsDeleted,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum Physicians {
        Table,
        Id,
        FirstName,
        LastName,
        Specialty,
        IsDeleted,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000003_create_prescriptions_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_prescriptions_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Prescriptions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Prescriptions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Prescriptions::PrescriptionNo)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Prescriptions::PatientId).uuid().not_null())
                        .col(ColumnDef::new(Prescriptions::PhysicianId).uuid().not_null())
                        .col(ColumnDef::new(Prescriptions::Status).string().not_null())
                        .col(ColumnDef::new(Prescriptions::Priority).string().not_null())
                        .col(
                            ColumnDef::new(Prescriptions::TotalCost)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Prescriptions::Notes).string().null())
                        .col(
                            ColumnDef::new(Prescriptions::DispensedAt)
                                .timestamp()
                                .null(),
                        )
                        .col(ColumnDef::new(Prescriptions::DispensedBy).uuid().null())
                        .col(
                            ColumnDef::new(Prescriptions::IsDeleted)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Prescriptions::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Prescriptions::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_prescriptions_status")
                        .table(Prescriptions::Table)
                        .col(Prescriptions::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_prescriptions_patient_id")
                        .table(Prescriptions::Table)
                        .col(Prescriptions::PatientId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PrescriptionItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PrescriptionItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PrescriptionItems::PrescriptionId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PrescriptionItems::ProductId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PrescriptionItems::QuantityPrescribed)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PrescriptionItems::QuantityDispensed)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(PrescriptionItems::UnitPrice)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PrescriptionItems::TotalPrice)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PrescriptionItems::IsDispensed)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(PrescriptionItems::Dosage).string().null())
                        .col(ColumnDef::new(PrescriptionItems::Frequency).string().null())
                        .col(ColumnDef::new(PrescriptionItems::Duration).string().null())
                        .col(
                            ColumnDef::new(PrescriptionItems::Instructions)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PrescriptionItems::DispensedAt)
                                .timestamp()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PrescriptionItems::DispensedBy)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PrescriptionItems::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PrescriptionItems::UpdatedAt)
                                .timestamp()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_prescription_items_prescription_id")
                        .table(PrescriptionItems::Table)
                        .col(PrescriptionItems::PrescriptionId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PrescriptionItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Prescriptions::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Prescriptions {
        Table,
        Id,
        PrescriptionNo,
        PatientId,
        PhysicianId,
        Status,
        Priority,
        TotalCost,
        Notes,
        DispensedAt,
        DispensedBy,
        IsDeleted,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum PrescriptionItems {
        Table,
        Id,
        PrescriptionId,
        ProductId,
        QuantityPrescribed,
        QuantityDispensed,
        UnitPrice,
        TotalPrice,
        IsDispensed,
        Dosage,
        Frequency,
        Duration,
        Instructions,
        DispensedAt,
        DispensedBy,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000004_create_dispensals_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_dispensals_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(DrugDispensals::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DrugDispensals::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DrugDispensals::DispensalNo)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DrugDispensals::PrescriptionId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DrugDispensals::TotalAmount)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(DrugDispensals::AmountPaid)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(DrugDispensals::PaymentMethod)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DrugDispensals::Notes).string().null())
                        .col(
                            ColumnDef::new(DrugDispensals::DispensedBy)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DrugDispensals::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_drug_dispensals_prescription_id")
                        .table(DrugDispensals::Table)
                        .col(DrugDispensals::PrescriptionId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(DispensalItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DispensalItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DispensalItems::DispensalId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DispensalItems::PrescriptionItemId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DispensalItems::ProductId).uuid().not_null())
                        .col(
                            ColumnDef::new(DispensalItems::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DispensalItems::UnitPrice)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DispensalItems::TotalPrice)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DispensalItems::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_dispensal_items_dispensal_id")
                        .table(DispensalItems::Table)
                        .col(DispensalItems::DispensalId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(DispensalItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(DrugDispensals::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum DrugDispensals {
        Table,
        Id,
        DispensalNo,
        PrescriptionId,
        TotalAmount,
        AmountPaid,
        PaymentMethod,
        Notes,
        DispensedBy,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum DispensalItems {
        Table,
        Id,
        DispensalId,
        PrescriptionItemId,
        ProductId,
        Quantity,
        UnitPrice,
        TotalPrice,
        CreatedAt,
    }
}

mod m20240101_000005_create_balance_transactions_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_balance_transactions_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(BalanceTransactions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(BalanceTransactions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BalanceTransactions::PatientId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BalanceTransactions::PrescriptionId)
                                .uuid()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(BalanceTransactions::Amount)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BalanceTransactions::TransactionType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BalanceTransactions::PaymentMethod)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(BalanceTransactions::Description)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(BalanceTransactions::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_balance_transactions_patient_id")
                        .table(BalanceTransactions::Table)
                        .col(BalanceTransactions::PatientId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_balance_transactions_created_at")
                        .table(BalanceTransactions::Table)
                        .col(BalanceTransactions::CreatedAt)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(BalanceTransactions::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum BalanceTransactions {
        Table,
        Id,
        PatientId,
        PrescriptionId,
        Amount,
        TransactionType,
        PaymentMethod,
        Description,
        CreatedAt,
    }
}

mod m20240101_000006_create_stock_movements_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_stock_movements_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockMovements::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockMovements::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockMovements::ProductId).uuid().not_null())
                        .col(
                            ColumnDef::new(StockMovements::MovementType)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::QuantityChange)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::PreviousQuantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMovements::NewQuantity)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockMovements::Reason).string().null())
                        .col(ColumnDef::new(StockMovements::ReferenceId).uuid().null())
                        .col(
                            ColumnDef::new(StockMovements::ReferenceType)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(StockMovements::CreatedBy).uuid().null())
                        .col(
                            ColumnDef::new(StockMovements::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_movements_product_id")
                        .table(StockMovements::Table)
                        .col(StockMovements::ProductId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockMovements::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum StockMovements {
        Table,
        Id,
        ProductId,
        MovementType,
        QuantityChange,
        PreviousQuantity,
        NewQuantity,
        Reason,
        ReferenceId,
        ReferenceType,
        CreatedBy,
        CreatedAt,
    }
}

mod m20240101_000007_create_users_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000007_create_users_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Users::Name).string().not_null())
                        .col(ColumnDef::new(Users::Email).string().not_null())
                        .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                        .col(ColumnDef::new(Users::Role).string().not_null())
                        .col(ColumnDef::new(Users::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Users::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_users_email")
                        .table(Users::Table)
                        .col(Users::Email)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Users {
        Table,
        Id,
        Name,
        Email,
        PasswordHash,
        Role,
        CreatedAt,
        UpdatedAt,
    }
}
