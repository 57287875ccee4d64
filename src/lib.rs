/*!
# Boxworks

Marketing website and admin back-office for a corrugated-box manufacturer,
built in Rust.

## Overview

The public side serves the company pages (about, industries served, contact
form). The admin side lets a logged-in administrator inspect the paper reel
inventory held by the remote REST API: the stock table, the reels currently
mounted on the corrugator, and the usage history of a single reel with
printable stickers. It also lists, registers and updates the back-office
records (reels, boxes, employees, salaries, industries and admins).

## Architecture

### Presentation Layer
- **Technologies**: axum, handlebars, rust_xlsxwriter
- Every page is rendered on the server; the browser only holds an opaque
  session cookie
- Sticker sheets are standalone HTML documents that print themselves

### Selector Layer
- Pure functions over an immutable snapshot fetched from the backend
  (filtering, sorting, option lists, totals)
- Small state machines for view state (single expansion, barcode lookup)

### Remote API Layer
- `reqwest` client; the bearer token is passed explicitly on every call

## Modules

- **models**: Reel, usage event and admin profile records
- **inventory**: stock table filters, ordering, option lists and totals
- **in_use**: single-expansion state of the in-use view
- **history**: barcode lookup state machine and print-ready records
- **format**: timestamp and weight formatting
- **records**: admin record definitions and form validation
- **load**: the Loaded / Failed outcome every view renders
- **error**: application error type
- **config**: configuration loading
- **api**: remote REST API client
- **session**: server-side sessions and login
- **downloader**: spreadsheet export
- **sticker**: sticker print documents
- **templates**: embedded HTML templates
- **site**: marketing pages and the contact form
- **mailer**: contact enquiry e-mail
- **admin**: admin record screens
- **app**: routing and admin page handlers

## Routes

- `/`, `/about`, `/industries`, `/contact` - public pages
- `/login`, `/logout` - admin session
- `/admin/reels/stock` - reel inventory, `/admin/reels/stock/export` for `ReelsInStock.xlsx`
- `/admin/reels/in-use` - reels in use with their usage entries
- `/admin/reels/usage/{barcode}` - usage history, `/stickers` for the print sheet
- `/admin/manage/{entity}` - record list, `/new` and `/{id}/edit` for the forms
*/

pub mod error;
pub mod format;
pub mod history;
pub mod in_use;
pub mod inventory;
pub mod load;
pub mod models;
pub mod records;

#[cfg(feature = "web")]
pub mod admin;
#[cfg(feature = "web")]
pub mod api;
#[cfg(feature = "web")]
pub mod app;
#[cfg(feature = "web")]
pub mod config;
#[cfg(feature = "web")]
pub mod downloader;
#[cfg(feature = "web")]
pub mod mailer;
#[cfg(feature = "web")]
pub mod session;
#[cfg(feature = "web")]
pub mod site;
#[cfg(feature = "web")]
pub mod sticker;
#[cfg(feature = "web")]
pub mod templates;

pub use error::AppError;
pub use load::LoadState;
pub use models::*;
