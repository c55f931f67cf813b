/*!
# Salesboard

A browser-based sales and leads dashboard, built in Rust.

## Overview

Salesboard serves an editable business dashboard over HTTP: tabular sales and
lead data lives in an in-memory per-session store, seeded with default tables
and exposed through a JSON API for viewing, cell editing, CSV import with
validation, CSV/XLSX export, KPI computation, analytics and chart rendering.

## Architecture

The application follows a client-server architecture:

### Frontend Layer
- **Technologies**: HTML, CSS, vanilla JavaScript
- Static pages consume the JSON API: table grids, KPI cards and chart images.

### Backend Layer
- **Technologies**: Rust, axum
- **Core Components**:
  - Table Store - per-session dashboards keyed by a `sid` cookie
  - Validation Pipeline - structural checks, numeric coercion, duplicate and
    range detection for edited or imported tables
  - Analytics Engine - KPIs, trends, geographic/brand/store breakdowns,
    demographic and vehicle-preference analysis
  - Chart Renderer - plotters-based PNG generation
  - Import/Export - CSV upload with replace/append semantics, CSV and XLSX
    downloads

### Data Persistence Layer
- Dashboard snapshots with Gzip compression and bincode serialization
- Custom binary (.bin.gz) download/upload round trip

## Modules

- **table**: Dynamic typed table (`CellValue`, `Table`) and JSON views
- **schema**: Table catalog, validation rule sets and column-name rules
- **validate**: Validation pipeline and problem annotation
- **seed**: Default dashboard data
- **store**: Session-keyed in-memory dashboard store
- **loader**: CSV parsing and the import pipeline
- **downloader**: Export functionality (CSV, XLSX)
- **saving**: Dashboard persistence with compression
- **sales**: Sales KPIs and analytics
- **leads**: Lead KPIs, demographics and vehicle preferences
- **graph**: Chart generation from dashboard tables
- **app**: Routing and middleware
*/

pub mod app;
pub mod downloader;
pub mod graph;
pub mod leads;
pub mod loader;
pub mod sales;
pub mod saving;
pub mod schema;
pub mod seed;
pub mod store;
pub mod table;
pub mod validate;
