use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101_000001_create_buyer_profiles_table::Migration),
            Box::new(m20260101_000002_create_orders_tables::Migration),
            Box::new(m20260101_000003_create_enrollments_table::Migration),
        ]
    }
}

// Migration implementations

mod m20260101_000001_create_buyer_profiles_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000001_create_buyer_profiles_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(BuyerProfiles::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(BuyerProfiles::Id)
                                .string()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(BuyerProfiles::Name).string().not_null())
                        .col(ColumnDef::new(BuyerProfiles::Email).string().not_null())
                        .col(ColumnDef::new(BuyerProfiles::Phone).string().not_null())
                        .col(ColumnDef::new(BuyerProfiles::AvatarRef).string().null())
                        .col(ColumnDef::new(BuyerProfiles::Bio).string().null())
                        .col(
                            ColumnDef::new(BuyerProfiles::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(ColumnDef::new(BuyerProfiles::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(BuyerProfiles::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum BuyerProfiles {
        Table,
        Id,
        Name,
        Email,
        Phone,
        AvatarRef,
        Bio,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20260101_000002_create_orders_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000002_create_orders_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Orders::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Orders::OrderNumber).string().not_null())
                        .col(ColumnDef::new(Orders::BuyerId).string().null())
                        .col(ColumnDef::new(Orders::BillingName).string().not_null())
                        .col(ColumnDef::new(Orders::BillingEmail).string().not_null())
                        .col(ColumnDef::new(Orders::BillingPhone).string().not_null())
                        .col(ColumnDef::new(Orders::BillingLine1).string().not_null())
                        .col(ColumnDef::new(Orders::BillingCity).string().not_null())
                        .col(ColumnDef::new(Orders::BillingState).string().not_null())
                        .col(
                            ColumnDef::new(Orders::BillingPostalCode)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Orders::BillingCountry).string().not_null())
                        .col(ColumnDef::new(Orders::Subtotal).big_integer().not_null())
                        .col(ColumnDef::new(Orders::TaxAmount).big_integer().not_null())
                        .col(
                            ColumnDef::new(Orders::TotalAmount)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Orders::Currency).string().not_null())
                        .col(ColumnDef::new(Orders::PaymentStatus).string().not_null())
                        .col(ColumnDef::new(Orders::ExternalPaymentRef).string().null())
                        .col(ColumnDef::new(Orders::CreatedAt).timestamp().not_null())
                        .col(ColumnDef::new(Orders::UpdatedAt).timestamp().null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_orders_order_number")
                        .table(Orders::Table)
                        .col(Orders::OrderNumber)
                        .unique()
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_orders_buyer_id")
                        .table(Orders::Table)
                        .col(Orders::BuyerId)
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_orders_payment_status")
                        .table(Orders::Table)
                        .col(Orders::PaymentStatus)
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderItems::OrderId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::CourseId).string().not_null())
                        .col(ColumnDef::new(OrderItems::Plan).string().not_null())
                        .col(ColumnDef::new(OrderItems::CourseName).string().not_null())
                        .col(
                            ColumnDef::new(OrderItems::UnitPrice)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderItems::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_order_items_order_id")
                        .table(OrderItems::Table)
                        .col(OrderItems::OrderId)
                        .if_not_exists()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum Orders {
        Table,
        Id,
        OrderNumber,
        BuyerId,
        BillingName,
        BillingEmail,
        BillingPhone,
        BillingLine1,
        BillingCity,
        BillingState,
        BillingPostalCode,
        BillingCountry,
        Subtotal,
        TaxAmount,
        TotalAmount,
        Currency,
        PaymentStatus,
        ExternalPaymentRef,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    pub enum OrderItems {
        Table,
        Id,
        OrderId,
        CourseId,
        Plan,
        CourseName,
        UnitPrice,
        CreatedAt,
    }
}

mod m20260101_000003_create_enrollments_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20260101_000003_create_enrollments_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Enrollments::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Enrollments::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Enrollments::BuyerId).string().not_null())
                        .col(ColumnDef::new(Enrollments::CourseId).string().not_null())
                        .col(ColumnDef::new(Enrollments::Plan).string().not_null())
                        .col(ColumnDef::new(Enrollments::CourseName).string().not_null())
                        .col(ColumnDef::new(Enrollments::OrderId).uuid().not_null())
                        .col(
                            ColumnDef::new(Enrollments::EnrolledAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Enrollments::AccessGranted)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .to_owned(),
                )
                .await?;

            // One grant per (buyer, course, plan), however many orders repeat it.
            manager
                .create_index(
                    Index::create()
                        .name("idx_enrollments_buyer_course_plan")
                        .table(Enrollments::Table)
                        .col(Enrollments::BuyerId)
                        .col(Enrollments::CourseId)
                        .col(Enrollments::Plan)
                        .unique()
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx_enrollments_order_id")
                        .table(Enrollments::Table)
                        .col(Enrollments::OrderId)
                        .if_not_exists()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Enrollments::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    pub enum Enrollments {
        Table,
        Id,
        BuyerId,
        CourseId,
        Plan,
        CourseName,
        OrderId,
        EnrolledAt,
        AccessGranted,
    }
}
