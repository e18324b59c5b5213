mod common;

use common::{billing_details, cart_item, order_input, test_buyer, TestApp};
use coursedesk_api::{
    entities::order::PaymentStatus,
    entities::order_item::Plan,
    errors::ServiceError,
    gateway::GatewayPaymentStatus,
    services::orders::{CreateOrderInput, TransitionOutcome},
};

#[tokio::test]
async fn successful_payment_completes_order_and_grants_access() {
    let app = TestApp::new().await;
    let buyer = test_buyer("buyer-a");

    let detail = app
        .state
        .services
        .orders
        .create_order(
            &buyer,
            order_input(vec![cart_item("c-programming", Plan::Short, "₹299")]),
        )
        .await
        .expect("order creation failed");

    assert_eq!(detail.order.payment_status, PaymentStatus::Pending);
    assert_eq!(detail.order.subtotal, 299);
    assert_eq!(detail.order.tax_amount, 54);
    assert_eq!(detail.order.total_amount, 353);
    assert_eq!(detail.items.len(), 1);

    app.gateway
        .script(&detail.order.order_number, GatewayPaymentStatus::Success);

    let outcome = app
        .state
        .services
        .reconciliation
        .reconcile(&detail.order.order_number)
        .await
        .expect("reconcile failed");

    assert_eq!(outcome.payment_status, PaymentStatus::Completed);
    assert!(outcome.clear_cart);

    let stored = app
        .state
        .services
        .orders
        .get_order(&detail.order.order_number)
        .await
        .unwrap();
    assert_eq!(stored.order.payment_status, PaymentStatus::Completed);
    assert!(stored.order.external_payment_ref.is_some());
    assert!(stored.order.updated_at.is_some());

    let enrollments = app
        .state
        .services
        .enrollments
        .list_enrollments("buyer-a")
        .await
        .unwrap();
    assert_eq!(enrollments.len(), 1);
    assert_eq!(enrollments[0].course_id, "c-programming");
    assert_eq!(enrollments[0].plan, Plan::Short);
    assert_eq!(enrollments[0].order_id, detail.order.id);
    assert!(enrollments[0].access_granted);
}

#[tokio::test]
async fn failed_payment_keeps_cart_and_grants_nothing() {
    let app = TestApp::new().await;
    let buyer = test_buyer("buyer-b");

    let detail = app
        .state
        .services
        .orders
        .create_order(
            &buyer,
            order_input(vec![cart_item("c-programming", Plan::Short, "₹299")]),
        )
        .await
        .unwrap();

    app.gateway
        .script(&detail.order.order_number, GatewayPaymentStatus::Failed);

    let outcome = app
        .state
        .services
        .reconciliation
        .reconcile(&detail.order.order_number)
        .await
        .unwrap();

    assert_eq!(outcome.payment_status, PaymentStatus::Failed);
    assert!(!outcome.clear_cart);

    let enrollments = app
        .state
        .services
        .enrollments
        .list_enrollments("buyer-b")
        .await
        .unwrap();
    assert!(enrollments.is_empty());
}

#[tokio::test]
async fn late_disagreeing_verdict_never_rewrites_a_completed_order() {
    let app = TestApp::new().await;
    let buyer = test_buyer("buyer-c");

    let detail = app
        .state
        .services
        .orders
        .create_order(
            &buyer,
            order_input(vec![cart_item("c-programming", Plan::Short, "₹299")]),
        )
        .await
        .unwrap();
    let order_number = detail.order.order_number.clone();

    app.gateway.script(&order_number, GatewayPaymentStatus::Success);
    app.state
        .services
        .reconciliation
        .reconcile(&order_number)
        .await
        .unwrap();

    // The gateway now claims the payment failed. The stored terminal state
    // must stand.
    app.gateway.script(&order_number, GatewayPaymentStatus::Failed);
    let outcome = app
        .state
        .services
        .reconciliation
        .reconcile(&order_number)
        .await
        .unwrap();

    assert_eq!(outcome.payment_status, PaymentStatus::Completed);
    assert!(outcome.clear_cart);

    let stored = app.state.services.orders.get_order(&order_number).await.unwrap();
    assert_eq!(stored.order.payment_status, PaymentStatus::Completed);

    let enrollments = app
        .state
        .services
        .enrollments
        .list_enrollments("buyer-c")
        .await
        .unwrap();
    assert_eq!(enrollments.len(), 1);
}

#[tokio::test]
async fn settled_orders_reject_further_transitions() {
    let app = TestApp::new().await;
    let buyer = test_buyer("buyer-d");

    let detail = app
        .state
        .services
        .orders
        .create_order(
            &buyer,
            order_input(vec![cart_item("rust", Plan::Long, "₹2,999")]),
        )
        .await
        .unwrap();

    app.gateway
        .script(&detail.order.order_number, GatewayPaymentStatus::Success);
    app.state
        .services
        .reconciliation
        .reconcile(&detail.order.order_number)
        .await
        .unwrap();

    // A duplicate settlement attempt converges on the stored state.
    let outcome = app
        .state
        .services
        .orders
        .update_status(detail.order.id, PaymentStatus::Failed, None)
        .await
        .unwrap();
    assert_eq!(
        outcome,
        TransitionOutcome::AlreadySettled(PaymentStatus::Completed)
    );

    // Moving back to pending is not a thing.
    let err = app
        .state
        .services
        .orders
        .update_status(detail.order.id, PaymentStatus::Pending, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidTransition(_)));

    let stored = app
        .state
        .services
        .orders
        .get_order(&detail.order.order_number)
        .await
        .unwrap();
    assert_eq!(stored.order.payment_status, PaymentStatus::Completed);
}

#[tokio::test]
async fn concurrent_reconciles_grant_access_exactly_once() {
    let app = TestApp::new().await;
    let buyer = test_buyer("buyer-e");

    let detail = app
        .state
        .services
        .orders
        .create_order(
            &buyer,
            order_input(vec![
                cart_item("c-programming", Plan::Short, "₹299"),
                cart_item("python", Plan::Long, "₹2,999"),
            ]),
        )
        .await
        .unwrap();
    let order_number = detail.order.order_number.clone();

    app.gateway.script(&order_number, GatewayPaymentStatus::Success);

    let recon = app.state.services.reconciliation.clone();
    let (first, second) = tokio::join!(
        recon.reconcile(&order_number),
        recon.reconcile(&order_number)
    );

    assert_eq!(first.unwrap().payment_status, PaymentStatus::Completed);
    assert_eq!(second.unwrap().payment_status, PaymentStatus::Completed);

    let enrollments = app
        .state
        .services
        .enrollments
        .list_enrollments("buyer-e")
        .await
        .unwrap();
    assert_eq!(enrollments.len(), 2);

    let mut course_ids: Vec<&str> = enrollments.iter().map(|e| e.course_id.as_str()).collect();
    course_ids.sort_unstable();
    assert_eq!(course_ids, vec!["c-programming", "python"]);
}

#[tokio::test]
async fn no_enrollment_ever_exists_without_a_completed_order() {
    let app = TestApp::new().await;
    let buyer = test_buyer("buyer-f");

    // One order left pending, one settled as failed.
    let pending = app
        .state
        .services
        .orders
        .create_order(&buyer, order_input(vec![cart_item("go", Plan::Short, "₹499")]))
        .await
        .unwrap();
    let failed = app
        .state
        .services
        .orders
        .create_order(&buyer, order_input(vec![cart_item("zig", Plan::Short, "₹699")]))
        .await
        .unwrap();

    app.gateway
        .script(&failed.order.order_number, GatewayPaymentStatus::Failed);
    app.state
        .services
        .reconciliation
        .reconcile(&failed.order.order_number)
        .await
        .unwrap();

    assert_eq!(
        pending.order.payment_status,
        PaymentStatus::Pending
    );
    let enrollments = app
        .state
        .services
        .enrollments
        .list_enrollments("buyer-f")
        .await
        .unwrap();
    assert!(enrollments.is_empty());
}

#[tokio::test]
async fn first_order_creates_the_buyer_profile() {
    let app = TestApp::new().await;
    let buyer = test_buyer("buyer-g");

    assert!(app
        .state
        .services
        .profiles
        .get_profile("buyer-g")
        .await
        .is_err());

    app.state
        .services
        .orders
        .create_order(&buyer, order_input(vec![cart_item("sql", Plan::Short, "₹199")]))
        .await
        .unwrap();

    let profile = app
        .state
        .services
        .profiles
        .get_profile("buyer-g")
        .await
        .unwrap();
    assert_eq!(profile.name, "Test Buyer");
    assert_eq!(profile.email, "buyer-g@example.com");
}

#[tokio::test]
async fn empty_cart_is_rejected_before_any_order_exists() {
    let app = TestApp::new().await;
    let buyer = test_buyer("buyer-h");

    let err = app
        .state
        .services
        .orders
        .create_order(&buyer, order_input(vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));

    assert!(app
        .state
        .services
        .orders
        .list_orders("buyer-h")
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn malformed_price_rejects_the_order() {
    let app = TestApp::new().await;
    let buyer = test_buyer("buyer-i");

    let err = app
        .state
        .services
        .orders
        .create_order(
            &buyer,
            order_input(vec![cart_item("lisp", Plan::Short, "contact us")]),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidPriceFormat(_)));
}

#[tokio::test]
async fn invalid_billing_email_is_rejected() {
    let app = TestApp::new().await;
    let buyer = test_buyer("buyer-j");

    let mut billing = billing_details();
    billing.email = "not-an-email".to_string();

    let err = app
        .state
        .services
        .orders
        .create_order(
            &buyer,
            CreateOrderInput {
                billing,
                items: vec![cart_item("c-programming", Plan::Short, "₹299")],
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ValidationError(_)));
}

#[tokio::test]
async fn duplicate_cart_lines_collapse_into_one_item() {
    let app = TestApp::new().await;
    let buyer = test_buyer("buyer-k");

    let detail = app
        .state
        .services
        .orders
        .create_order(
            &buyer,
            order_input(vec![
                cart_item("c-programming", Plan::Short, "₹299"),
                cart_item("c-programming", Plan::Short, "₹299"),
            ]),
        )
        .await
        .unwrap();

    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.order.subtotal, 299);
}

#[tokio::test]
async fn repeat_purchase_does_not_duplicate_enrollment() {
    let app = TestApp::new().await;
    let buyer = test_buyer("buyer-l");

    for _ in 0..2 {
        let detail = app
            .state
            .services
            .orders
            .create_order(
                &buyer,
                order_input(vec![cart_item("c-programming", Plan::Short, "₹299")]),
            )
            .await
            .unwrap();
        app.gateway
            .script(&detail.order.order_number, GatewayPaymentStatus::Success);
        app.state
            .services
            .reconciliation
            .reconcile(&detail.order.order_number)
            .await
            .unwrap();
    }

    let enrollments = app
        .state
        .services
        .enrollments
        .list_enrollments("buyer-l")
        .await
        .unwrap();
    assert_eq!(enrollments.len(), 1);
}
