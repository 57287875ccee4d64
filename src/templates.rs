//! Template engine setup and HTML templates.

use handlebars::Handlebars;
use lazy_static::lazy_static;
use serde::Serialize;

use crate::error::AppError;

lazy_static! {
    /// Global template registry with embedded templates
    static ref TEMPLATES: Handlebars<'static> = build_registry();
}

fn build_registry() -> Handlebars<'static> {
    let mut hb = Handlebars::new();
    hb.set_strict_mode(false);

    for (name, source) in PARTIALS {
        hb.register_partial(name, *source)
            .expect("Failed to load partial");
    }
    for (name, source) in PAGES {
        hb.register_template_string(name, *source)
            .expect("Failed to load template");
    }
    hb
}

/// Render a template with the given data
pub fn render<T: Serialize>(template: &str, data: &T) -> Result<String, AppError> {
    Ok(TEMPLATES.render(template, data)?)
}

const PARTIALS: &[(&str, &str)] = &[
    ("header", HEADER_PARTIAL),
    ("footer", FOOTER_PARTIAL),
    ("status", STATUS_PARTIAL),
];

const PAGES: &[(&str, &str)] = &[
    ("home", HOME_TEMPLATE),
    ("about", ABOUT_TEMPLATE),
    ("industries", INDUSTRIES_TEMPLATE),
    ("contact", CONTACT_TEMPLATE),
    ("login", LOGIN_TEMPLATE),
    ("error", ERROR_TEMPLATE),
    ("dashboard", DASHBOARD_TEMPLATE),
    ("stock", STOCK_TEMPLATE),
    ("in_use", IN_USE_TEMPLATE),
    ("usage", USAGE_TEMPLATE),
    ("stickers", STICKERS_TEMPLATE),
    ("records", RECORDS_TEMPLATE),
    ("record_form", RECORD_FORM_TEMPLATE),
];

// =============================================================================
// Partials
// =============================================================================

const HEADER_PARTIAL: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{{title}} | Boxworks Corrugated</title>
    <style>
        * { box-sizing: border-box; }
        body { font-family: "Segoe UI", Helvetica, Arial, sans-serif; margin: 0; color: #1f2933; background: #f7f5f0; }
        header { background: #6b4f2a; color: #fff; padding: 14px 32px; display: flex; justify-content: space-between; align-items: center; }
        header a { color: #fff; text-decoration: none; margin-left: 18px; }
        main { max-width: 1280px; margin: 0 auto; padding: 24px 32px; }
        table { border-collapse: collapse; width: 100%; background: #fff; }
        th, td { border: 1px solid #e0dcd3; padding: 6px 8px; text-align: left; font-size: 14px; }
        th { background: #efe9dd; }
        .banner { padding: 10px 14px; margin: 12px 0; border-radius: 4px; }
        .banner.error { background: #fde8e8; color: #9b1c1c; border: 1px solid #f8b4b4; }
        .banner.loading { background: #e1effe; color: #1e429f; }
        .filters { display: flex; flex-wrap: wrap; gap: 8px; margin-bottom: 12px; }
        .summary { margin: 12px 0; font-weight: 600; }
        .active { color: #057a55; font-weight: 600; }
        .usage-row td { background: #fbfaf7; }
        .record-form label { display: block; margin: 10px 0 4px; font-weight: 600; }
        .record-form input, .record-form select, .record-form textarea { width: 360px; padding: 6px; }
        .hint { color: #6b7280; font-size: 13px; }
        button[disabled] { opacity: 0.5; cursor: not-allowed; }
    </style>
</head>
<body>
<header>
    <a href="/"><strong>Boxworks Corrugated</strong></a>
    <nav>
        {{#if admin_name}}
        <a href="/admin">Dashboard</a>
        <a href="/admin/reels/stock">Reel Stock</a>
        <a href="/admin/reels/in-use">In Use</a>
        <a href="/admin/reels/usage">Usage History</a>
        <form method="post" action="/logout" style="display:inline"><button type="submit">Log out ({{admin_name}})</button></form>
        {{else}}
        <a href="/about">About</a>
        <a href="/industries">Industries</a>
        <a href="/contact">Contact</a>
        <a href="/login">Admin</a>
        {{/if}}
    </nav>
</header>
<main>
"##;

const FOOTER_PARTIAL: &str = r##"</main>
</body>
</html>
"##;

const STATUS_PARTIAL: &str = r##"{{#if banner.loading}}<div class="banner loading">Loading...</div>{{/if}}
{{#if banner.error}}<div class="banner error" role="alert">{{banner.error}}</div>{{/if}}
"##;

// =============================================================================
// Public pages
// =============================================================================

const HOME_TEMPLATE: &str = r##"{{> header}}
<h1>Corrugated boxes built for the way you ship</h1>
<p>{{company.tagline}}</p>
<p>Since {{company.founded}} we have supplied {{company.capacity}} of corrugated packaging from our plant in {{company.city}}.</p>
<h2>Industries we serve</h2>
<ul>
{{#each industries}}<li><a href="/industries#{{slug}}">{{name}}</a></li>{{/each}}
</ul>
<p><a href="/contact">Request a quote</a></p>
{{> footer}}
"##;

const ABOUT_TEMPLATE: &str = r##"{{> header}}
<h1>About {{company.name}}</h1>
<p>{{company.tagline}}</p>
<ul>
    <li>Established: {{company.founded}}</li>
    <li>Plant: {{company.city}}</li>
    <li>Monthly capacity: {{company.capacity}}</li>
</ul>
<h2>What we make</h2>
<ul>
{{#each company.products}}<li>{{this}}</li>{{/each}}
</ul>
{{> footer}}
"##;

const INDUSTRIES_TEMPLATE: &str = r##"{{> header}}
<h1>Industries</h1>
{{#each industries}}
<section id="{{slug}}">
    <h2>{{name}}</h2>
    <p>{{summary}}</p>
</section>
{{/each}}
{{> footer}}
"##;

const CONTACT_TEMPLATE: &str = r##"{{> header}}
<h1>Contact us</h1>
{{> status}}
{{#if sent}}<div class="banner loading">Thank you, {{form.name}}. We will get back to you shortly.</div>{{/if}}
{{#if errors}}
<div class="banner error" role="alert"><ul>{{#each errors}}<li>{{this}}</li>{{/each}}</ul></div>
{{/if}}
<form method="post" action="/contact">
    <p><label>Name <input name="name" value="{{form.name}}" required></label></p>
    <p><label>Email <input name="email" type="email" value="{{form.email}}" required></label></p>
    <p><label>Phone <input name="phone" value="{{form.phone}}"></label></p>
    <p><label>Company <input name="company" value="{{form.company}}"></label></p>
    <p><label>Message <textarea name="message" rows="5" required>{{form.message}}</textarea></label></p>
    <p><button type="submit">Send</button></p>
</form>
{{> footer}}
"##;

const LOGIN_TEMPLATE: &str = r##"{{> header}}
<h1>Admin login</h1>
{{> status}}
<form method="post" action="/login">
    <p><label>Email <input name="email" type="email" value="{{email}}" required></label></p>
    <p><label>Password <input name="password" type="password" required></label></p>
    <p><button type="submit">Log in</button></p>
</form>
{{> footer}}
"##;

const ERROR_TEMPLATE: &str = r##"{{> header}}
<h1>{{title}}</h1>
{{> status}}
{{#if needs_login}}<p><a href="/login">Go to login</a></p>{{else}}<p><a href="javascript:history.back()">Go back</a></p>{{/if}}
{{> footer}}
"##;

// =============================================================================
// Admin pages
// =============================================================================

const DASHBOARD_TEMPLATE: &str = r##"{{> header}}
<h1>Welcome, {{admin_name}}</h1>
{{#if admin_email}}<p>Signed in as {{admin_email}}{{#if admin_role}} ({{admin_role}}){{/if}}</p>{{/if}}
<ul>
    <li><a href="/admin/reels/stock">Reels in stock</a>: search, filter and export the inventory</li>
    <li><a href="/admin/reels/in-use">Reels in use</a>: reels on the corrugator with their usage entries</li>
    <li><a href="/admin/reels/usage">Reel usage history</a>: look up a barcode and print stickers</li>
</ul>
<h2>Records</h2>
<ul id="manage-links">
    {{#each entities}}<li><a href="{{href}}">{{title}}</a></li>{{/each}}
</ul>
{{> footer}}
"##;

const STOCK_TEMPLATE: &str = r##"{{> header}}
<h1>Reels in stock</h1>
<form method="get" action="/admin/reels/stock" class="filters">
    <input name="barcode" placeholder="Search barcode" value="{{filters.barcode}}">
    <input name="supplier" placeholder="Search supplier" value="{{filters.supplier}}">
    {{#each selects}}
    <select name="{{name}}">
        <option value="">{{label}}: all</option>
        {{#each options}}<option value="{{value}}"{{#if selected}} selected{{/if}}>{{value}}</option>{{/each}}
    </select>
    {{/each}}
    <button type="submit">Apply</button>
    <a href="/admin/reels/stock">Reset</a>
</form>
{{> status}}
{{#if loaded}}
<div class="summary">
    Reels: <span id="reel-count">{{count}}</span> &middot;
    Total current weight: <span id="total-weight">{{total}}</span>
    &middot; <a href="{{export_href}}">Export to Excel</a>
</div>
<table id="stock-table">
    <thead>
        <tr>
            <th>#</th><th>Barcode</th><th>Reel No</th><th>GSM</th><th>BF</th><th>Deckle</th>
            <th>Paper Type</th><th>Supplier</th><th>Unit</th><th>Initial Wt</th><th>Current Wt</th>
            <th>Previous Wt</th><th>Status</th><th>Created</th>
        </tr>
    </thead>
    <tbody>
    {{#each rows}}
        <tr data-barcode="{{barcode}}">
            <td>{{position}}</td><td><a href="/admin/reels/usage/{{barcode_path}}">{{barcode}}</a></td><td>{{reel_no}}</td>
            <td>{{gsm}}</td><td>{{bf}}</td><td>{{deckle}}</td><td>{{paper_type}}</td><td>{{supplier}}</td>
            <td>{{unit}}</td><td>{{initial_weight}}</td><td>{{current_weight}}</td><td>{{previous_weight}}</td>
            <td>{{status}}</td><td>{{created}}</td>
        </tr>
    {{else}}
        <tr><td colspan="14">No reels match the current filters.</td></tr>
    {{/each}}
    </tbody>
</table>
{{/if}}
{{> footer}}
"##;

const IN_USE_TEMPLATE: &str = r##"{{> header}}
<h1>Reels in use</h1>
{{> status}}
{{#if loaded}}
<table id="in-use-table">
    <thead>
        <tr><th></th><th>Barcode</th><th>Reel No</th><th>GSM</th><th>BF</th><th>Deckle</th><th>Current Wt</th><th>Status</th><th>Usages</th></tr>
    </thead>
    <tbody>
    {{#each rows}}
        <tr class="reel-row{{#if expanded}} expanded{{/if}}" data-barcode="{{barcode}}">
            <td><a href="{{toggle_href}}">{{#if expanded}}&#9660;{{else}}&#9654;{{/if}}</a></td>
            <td><a href="{{toggle_href}}">{{barcode}}</a></td><td>{{reel_no}}</td><td>{{gsm}}</td><td>{{bf}}</td>
            <td>{{deckle}}</td><td>{{current_weight}}</td><td>{{status}}</td><td>{{usage_count}}</td>
        </tr>
        {{#if expanded}}
        <tr class="usage-row" data-usages-for="{{barcode}}">
            <td colspan="9">
                <table>
                    <thead><tr><th>Client</th><th>Product</th><th>Qty</th><th>Size</th><th>Unit</th><th>Boxes</th><th>Wt Consumed</th><th>Date In</th><th>Date Out</th></tr></thead>
                    <tbody>
                    {{#each usages}}
                        <tr>
                            <td>{{client}}</td><td>{{product_type}}</td><td>{{quantity}}</td><td>{{size}}</td><td>{{unit}}</td>
                            <td>{{box_count}}</td><td>{{weight_consumed}}</td><td>{{date_in}}</td>
                            <td{{#if active}} class="active"{{/if}}>{{date_out}}</td>
                        </tr>
                    {{else}}
                        <tr><td colspan="9">No usage recorded yet.</td></tr>
                    {{/each}}
                    </tbody>
                </table>
            </td>
        </tr>
        {{/if}}
    {{else}}
        <tr><td colspan="9">No reels are in use.</td></tr>
    {{/each}}
    </tbody>
</table>
{{/if}}
{{> footer}}
"##;

const USAGE_TEMPLATE: &str = r##"{{> header}}
<h1>Reel usage history</h1>
<form method="get" action="/admin/reels/usage/search" class="filters">
    <input name="barcode" placeholder="Barcode ID" value="{{barcode_input}}">
    <button type="submit">Search</button>
    <button type="button" id="print-stickers"{{#unless can_print}} disabled{{/unless}}
        onclick="window.open('{{stickers_href}}', 'stickers', 'width={{window_width}},height={{window_height}}')">Print stickers</button>
</form>
{{> status}}
{{#if pending}}<p>Showing the lookup for <a href="/admin/reels/usage/{{pending_path}}">{{pending}}</a>, which is still in progress.</p>{{/if}}
{{#if loaded}}
<h2>Barcode {{barcode}}</h2>
<table id="usage-table">
    <thead>
        <tr><th>#</th><th>Client</th><th>Product</th><th>Qty</th><th>Size</th><th>Unit</th><th>Boxes</th>
            <th>Wt Consumed</th><th>Previous Wt</th><th>Usage Type</th><th>Date In</th><th>Date Out</th></tr>
    </thead>
    <tbody>
    {{#each records}}
        <tr>
            <td>{{position}}</td><td>{{client}}</td><td>{{product_type}}</td><td>{{quantity}}</td><td>{{size}}</td>
            <td>{{unit}}</td><td>{{box_count}}</td><td>{{weight_consumed}}</td><td>{{previous_weight}}</td>
            <td>{{usage_type}}</td><td>{{date_in}}</td><td{{#if active}} class="active"{{/if}}>{{date_out}}</td>
        </tr>
    {{else}}
        <tr><td colspan="12">No usage recorded for this reel.</td></tr>
    {{/each}}
    </tbody>
</table>
{{/if}}
{{> footer}}
"##;

// =============================================================================
// Print document
// =============================================================================

const RECORDS_TEMPLATE: &str = r##"{{> header}}
<h1>{{title}}</h1>
<p><a href="{{new_href}}">Register a new {{singular}}</a></p>
{{> status}}
{{#if loaded}}
<table id="records-table">
    <thead>
        <tr>{{#each columns}}<th>{{this}}</th>{{/each}}<th></th></tr>
    </thead>
    <tbody>
    {{#each rows}}
        <tr>
            {{#each cells}}<td>{{this}}</td>{{/each}}
            <td>{{#if edit_href}}<a href="{{edit_href}}">Edit</a>{{/if}}</td>
        </tr>
    {{else}}
        <tr><td colspan="99">No records yet.</td></tr>
    {{/each}}
    </tbody>
</table>
{{/if}}
{{> footer}}
"##;

const RECORD_FORM_TEMPLATE: &str = r##"{{> header}}
<h1>{{title}}</h1>
<p><a href="{{entity.href}}">Back to {{entity.title}}</a></p>
{{#if errors}}
<div class="banner error" role="alert">
    <ul>{{#each errors}}<li>{{this}}</li>{{/each}}</ul>
</div>
{{/if}}
<form method="post" action="{{action}}" class="record-form">
    {{#each fields}}
    <label for="{{name}}">{{label}}{{#if required}} *{{/if}}</label>
    {{#if choices}}
    <select id="{{name}}" name="{{name}}"{{#if required}} required{{/if}}>
        <option value="">Choose...</option>
        {{#each choices}}<option value="{{value}}"{{#if selected}} selected{{/if}}>{{value}}</option>{{/each}}
    </select>
    {{else}}{{#if textarea}}
    <textarea id="{{name}}" name="{{name}}" rows="3">{{value}}</textarea>
    {{else}}
    <input id="{{name}}" name="{{name}}" type="{{input_type}}" value="{{value}}"{{#if required}} required{{/if}}>
    {{/if}}{{/if}}
    {{#if hint}}<div class="hint">{{hint}}</div>{{/if}}
    {{/each}}
    <p><button type="submit">Save</button></p>
</form>
{{> footer}}
"##;

const STICKERS_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Stickers {{barcode}}</title>
    <style>
        @page { size: {{width_mm}}mm {{height_mm}}mm; margin: 0; }
        html, body { margin: 0; padding: 0; }
        body { font-family: Arial, sans-serif; font-size: 9pt; }
        .sticker {
            width: {{width_mm}}mm;
            height: {{height_mm}}mm;
            padding: 3mm;
            box-sizing: border-box;
            overflow: hidden;
            page-break-after: always;
            break-after: page;
        }
        .sticker:last-of-type { page-break-after: auto; break-after: auto; }
        .sticker .barcode { font-size: 14pt; font-weight: bold; }
        .sticker .entry { float: right; }
        .sticker table { width: 100%; border-collapse: collapse; }
        .sticker td { padding: 0.5mm 0; vertical-align: top; }
        .sticker td.key { width: 40%; font-weight: bold; }
    </style>
    <script>
        window.onload = function () {
            window.focus();
            window.print();
            setTimeout(function () { window.close(); }, {{close_delay_ms}});
        };
    </script>
</head>
<body>
{{#each stickers}}
<div class="sticker">
    <div><span class="barcode">{{../barcode}}</span><span class="entry">Entry {{entry}} of {{total}}</span></div>
    <table>
        <tr><td class="key">Client</td><td>{{record.client}}</td></tr>
        <tr><td class="key">Product</td><td>{{record.product_type}}</td></tr>
        <tr><td class="key">Quantity</td><td>{{record.quantity}} {{record.unit}}</td></tr>
        <tr><td class="key">Size</td><td>{{record.size}}</td></tr>
        <tr><td class="key">Boxes</td><td>{{record.box_count}}</td></tr>
        <tr><td class="key">Wt Consumed</td><td>{{record.weight_consumed}}</td></tr>
        <tr><td class="key">Previous Wt</td><td>{{record.previous_weight}}</td></tr>
        <tr><td class="key">Usage Type</td><td>{{record.usage_type}}</td></tr>
        <tr><td class="key">Date In</td><td>{{record.date_in}}</td></tr>
        <tr><td class="key">Date Out</td><td>{{record.date_out}}</td></tr>
    </table>
</div>
{{/each}}
</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_template_renders_with_empty_data() {
        for (name, _) in PAGES {
            assert!(render(name, &json!({})).is_ok(), "template {} failed", name);
        }
    }

    #[test]
    fn output_is_escaped() {
        let html = render(
            "error",
            &json!({ "title": "x", "banner": { "error": "<script>alert(1)</script>" } }),
        )
        .unwrap();
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn nav_depends_on_login() {
        let public = render("home", &json!({ "title": "Home" })).unwrap();
        assert!(public.contains("href=\"/login\""));
        let admin = render("dashboard", &json!({ "title": "Dashboard", "admin_name": "Asha" })).unwrap();
        assert!(admin.contains("Log out (Asha)"));
    }
}
