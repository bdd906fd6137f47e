use shop_widgets::{Error, Page, PriceAggregator, Result, WidgetConfig, parse_price_text, to_fixed};

fn cart_html(prices: &[&str], with_total: bool) -> String {
    let mut html = String::from("<section id='cart'><ul>");
    for price in prices {
        html.push_str(&format!(
            "<li><span class='name'>item</span> <span class='generic-price'>{price}</span></li>"
        ));
    }
    html.push_str("</ul>");
    if with_total {
        html.push_str("<p class='total-price'>Total Price: €0.00</p>");
    }
    html.push_str("</section>");
    html
}

fn initialized(prices: &[&str], with_total: bool) -> Result<Page> {
    let mut page = Page::from_html(&cart_html(prices, with_total))?;
    page.set_trace_stderr(false);
    page.initialize()?;
    Ok(page)
}

#[test]
fn sums_mixed_prices_to_two_decimals() -> Result<()> {
    let page = initialized(&["€10", "€5.5", "€0"], true)?;
    page.assert_text(".total-price", "Total Price: €15.50")?;
    Ok(())
}

#[test]
fn unparseable_price_contributes_nothing() -> Result<()> {
    let page = initialized(&["abc", "€3"], true)?;
    page.assert_text(".total-price", "Total Price: €3.00")?;
    let summary = page
        .price_summary()
        .ok_or_else(|| Error::InvalidArgument("summary missing".into()))?;
    assert_eq!(summary.counted, 1);
    assert_eq!(summary.skipped, 1);
    Ok(())
}

#[test]
fn no_prices_show_zero_total() -> Result<()> {
    let page = initialized(&[], true)?;
    page.assert_text(".total-price", "Total Price: €0.00")?;
    Ok(())
}

#[test]
fn missing_total_display_is_not_an_error() -> Result<()> {
    let html = cart_html(&["€1", "€2"], false);
    let untouched = Page::from_html(&html)?.dump_dom("#cart")?;
    let page = initialized(&["€1", "€2"], false)?;
    assert_eq!(page.dump_dom("#cart")?, untouched);
    let summary = page
        .price_summary()
        .ok_or_else(|| Error::InvalidArgument("summary missing".into()))?;
    assert_eq!(summary.total, 3.0);
    assert_eq!(summary.label, None);
    Ok(())
}

#[test]
fn only_the_first_total_display_is_written() -> Result<()> {
    let mut page = Page::from_html(
        "<span class='generic-price'>€2</span>\
         <p id='a' class='total-price'>old</p><p id='b' class='total-price'>old</p>",
    )?;
    page.initialize()?;
    page.assert_text("#a", "Total Price: €2.00")?;
    page.assert_text("#b", "old")?;
    Ok(())
}

#[test]
fn nested_markup_and_entities_inside_prices() -> Result<()> {
    let mut page = Page::from_html(
        "<span class='generic-price'>&euro;<b>1</b>.25</span>\
         <span class='generic-price'>&#8364;&nbsp;2</span>\
         <div class='total-price'></div>",
    )?;
    page.initialize()?;
    page.assert_text(".total-price", "Total Price: €3.25")?;
    Ok(())
}

#[test]
fn rounding_follows_to_fixed() -> Result<()> {
    let page = initialized(&["€0.1", "€0.2"], true)?;
    page.assert_text(".total-price", "Total Price: €0.30")?;

    let page = initialized(&["€1.005"], true)?;
    page.assert_text(".total-price", "Total Price: €1.00")?;

    assert_eq!(to_fixed(1234567.891, 2)?, "1234567.89");
    assert!(matches!(to_fixed(1.0, 101), Err(Error::InvalidArgument(_))));
    Ok(())
}

#[test]
fn leading_number_is_taken_from_noisy_text() {
    assert_eq!(parse_price_text("€12.50 each", "€"), Some(12.5));
    assert_eq!(parse_price_text("€.5", "€"), Some(0.5));
    assert_eq!(parse_price_text("€1e2", "€"), Some(100.0));
    assert_eq!(parse_price_text("€Infinity", "€"), Some(f64::INFINITY));
    assert_eq!(parse_price_text("free", "€"), None);
}

#[test]
fn aggregator_can_run_directly_on_a_dom() -> Result<()> {
    let config = WidgetConfig {
        currency_symbol: "£".into(),
        ..WidgetConfig::default()
    };
    let mut dom = shop_widgets::Dom::from_html(
        "<i class='generic-price'>£4</i><i class='generic-price'>£0.5</i><b class='total-price'></b>",
    )?;
    let summary = PriceAggregator::new(&config).render(&mut dom)?;
    assert_eq!(summary.label.as_deref(), Some("Total Price: £4.50"));
    Ok(())
}
