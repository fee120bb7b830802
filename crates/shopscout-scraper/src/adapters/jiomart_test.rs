use super::*;
use crate::adapters::test_support::{env, test_config};
use crate::session::stub::{Step, StubSessionFactory};

fn card(n: usize) -> String {
    format!(
        r#"<li class="ais-InfiniteHits-item">
            <a href="/p/groceries/atta-{n}/59000{n}">
                <img src="https://www.jiomart.com/images/product/{n}.jpg">
                <div class="plp-card-details-name"> Aashirvaad Atta {n} kg </div>
                <div class="plp-card-details-price"><span>₹ 4{n}5.00</span></div>
            </a>
        </li>"#
    )
}

fn results_page(cards: &[String]) -> String {
    format!(
        r#"<html><body><ol class="ais-InfiniteHits-list">{}</ol></body></html>"#,
        cards.concat()
    )
}

fn factory(page: String) -> StubSessionFactory {
    StubSessionFactory::new()
        .route("https://www.jiomart.com/search?q=", page)
        .route("https://www.jiomart.com/", "<html><body>home</body></html>")
}

fn adapter(factory: &StubSessionFactory) -> JioMartAdapter {
    JioMartAdapter::new(&test_config(), env(factory))
}

#[tokio::test]
async fn search_sets_pincode_cookie_before_searching() {
    let factory = factory(results_page(&[card(1)]));
    let log = factory.log();

    adapter(&factory).search("atta").await;

    let calls = log.calls();
    let expected_prefix = [
        "open",
        "navigate https://www.jiomart.com/",
        "set_cookie custPincode=400020",
        "navigate https://www.jiomart.com/search?q=atta",
    ];
    assert_eq!(&calls[..4], &expected_prefix, "calls: {calls:?}");
    assert_eq!(calls.last().map(String::as_str), Some("close"));
}

#[tokio::test]
async fn search_uses_configured_pincode() {
    let factory = factory(results_page(&[card(1)]));
    let log = factory.log();
    let mut config = test_config();
    config.jiomart_pincode = "560001".to_string();

    JioMartAdapter::new(&config, env(&factory)).search("atta").await;

    assert!(log.calls().contains(&"set_cookie custPincode=560001".to_string()));
}

#[tokio::test]
async fn search_extracts_cards_when_no_modal_appears() {
    let factory = factory(results_page(&[card(1), card(2)]));

    let products = adapter(&factory).search("atta").await;

    assert_eq!(products.len(), 2);
    assert_eq!(products[0].name, "Aashirvaad Atta 1 kg");
    assert_eq!(
        products[0].detail_url,
        "https://www.jiomart.com/p/groceries/atta-1/590001"
    );
    assert_eq!(products[0].price, Some(415.0));
    assert_eq!(products[0].site, "jiomart");
}

#[tokio::test]
async fn search_caps_results_at_forty() {
    let cards: Vec<String> = (1..=45).map(card).collect();
    let products = adapter(&factory(results_page(&cards))).search("atta").await;
    assert_eq!(products.len(), 40);
}

#[tokio::test]
async fn search_reports_missing_price_as_absent() {
    let cards = vec![card(1).replace(r#"<div class="plp-card-details-price"><span>₹ 415.00</span></div>"#, "")];
    let products = adapter(&factory(results_page(&cards))).search("atta").await;
    assert_eq!(products.len(), 1);
    assert!(products[0].price.is_none());
}

#[tokio::test]
async fn sessions_go_direct_with_randomized_mobile_agent() {
    let factory = factory(results_page(&[card(1)]));
    let log = factory.log();

    adapter(&factory).search("atta").await;

    let config = &log.configs()[0];
    assert!(config.proxy.is_none());
    assert!(config.profile.user_agent.contains("Android 10; SM-"));
}

#[test]
fn randomized_user_agent_stays_in_range() {
    for _ in 0..20 {
        let ua = randomized_mobile_user_agent();
        let model: u16 = ua
            .split("SM-")
            .nth(1)
            .and_then(|rest| rest.get(..3))
            .and_then(|digits| digits.parse().ok())
            .expect("model number");
        assert!((100..=999).contains(&model), "ua: {ua}");
    }
}

#[tokio::test]
async fn search_never_fails_when_a_session_step_errors() {
    for step in Step::ALL {
        let factory = factory(results_page(&[card(1)])).fail_at(step);
        let log = factory.log();

        let products = adapter(&factory).search("atta").await;

        match step {
            Step::Open | Step::Navigate | Step::SetCookie | Step::Wait => {
                assert!(products.is_empty(), "step {step:?} produced {products:?}");
            }
            Step::Click => assert_eq!(products.len(), 1, "modal failure must be ignored"),
            _ => {}
        }
        assert_eq!(log.opened(), log.closed(), "step {step:?} leaked a session");
    }
}
