//! Built-in demo datasets.
//!
//! Every new session starts from these tables: a year of Brazilian
//! dealership sales plus lead demographics.

use crate::schema::{Category, table_configs};
use crate::table::{CellValue, Table};
use std::collections::HashMap;

/// All tables of a fresh dashboard, keyed by `data_key`.
pub type Dashboard = HashMap<String, Table>;

fn n(v: f64) -> CellValue {
    CellValue::Number(v)
}

fn t(s: &str) -> CellValue {
    CellValue::Text(s.to_string())
}

fn monthly() -> Table {
    Table::from_rows(
        &["month", "leads", "sales", "revenue", "conversion", "avg_ticket"],
        vec![
            vec![t("sep-20"), n(26.0), n(5.0), n(259.0), n(0.19), n(51.9)],
            vec![t("oct-20"), n(931.0), n(35.0), n(1676.0), n(0.04), n(47.9)],
            vec![t("nov-20"), n(1207.0), n(44.0), n(2279.0), n(0.04), n(51.8)],
            vec![t("dec-20"), n(1008.0), n(33.0), n(2603.0), n(0.03), n(78.9)],
            vec![t("jan-21"), n(1058.0), n(32.0), n(2297.0), n(0.03), n(71.8)],
            vec![t("feb-21"), n(1300.0), n(68.0), n(3631.0), n(0.05), n(53.4)],
            vec![t("mar-21"), n(1932.0), n(119.0), n(7911.0), n(0.06), n(66.5)],
            vec![t("apr-21"), n(2376.0), n(142.0), n(7478.0), n(0.06), n(52.7)],
            vec![t("may-21"), n(3819.0), n(394.0), n(21508.0), n(0.10), n(54.6)],
            vec![t("jun-21"), n(4440.0), n(589.0), n(33179.0), n(0.13), n(56.3)],
            vec![t("jul-21"), n(6130.0), n(1073.0), n(58988.0), n(0.18), n(55.0)],
            vec![t("aug-21"), n(6353.0), n(1254.0), n(68274.0), n(0.20), n(54.4)],
        ],
    )
}

fn states() -> Table {
    Table::from_rows(
        &["state", "state_code", "sales", "lat", "lon", "region"],
        vec![
            vec![t("São Paulo"), t("SP"), n(734.0), n(-23.5505), n(-46.6333), t("Southeast")],
            vec![t("Minas Gerais"), t("MG"), n(142.0), n(-19.9167), n(-43.9345), t("Southeast")],
            vec![t("Santa Catarina"), t("SC"), n(110.0), n(-27.5954), n(-48.5480), t("South")],
            vec![t("Rio Grande do Sul"), t("RS"), n(98.0), n(-30.0346), n(-51.2177), t("South")],
            vec![t("Rio de Janeiro"), t("RJ"), n(66.0), n(-22.9068), n(-43.1729), t("Southeast")],
        ],
    )
}

fn brands() -> Table {
    Table::from_rows(
        &["brand", "sales", "category"],
        vec![
            vec![t("FIAT"), n(248.0), t("Popular")],
            vec![t("CHEVROLET"), n(237.0), t("Popular")],
            vec![t("VOLKSWAGEN"), n(193.0), t("Popular")],
            vec![t("FORD"), n(136.0), t("SUV")],
            vec![t("RENAULT"), n(108.0), t("Popular")],
        ],
    )
}

fn stores() -> Table {
    Table::from_rows(
        &["store", "sales", "city", "state"],
        vec![
            vec![t("KIYOKO CILEIDI JERY LTDA"), n(18.0), t("São Paulo"), t("SP")],
            vec![t("CLAUDINEO JOZENAIDE LUYANE LTDA"), n(15.0), t("Belo Horizonte"), t("MG")],
            vec![t("ADO JUBERTH VALTUIDES LTDA"), n(10.0), t("Florianópolis"), t("SC")],
            vec![t("GERRIVALDO ROSIELEN VALTEIDE LTDA"), n(10.0), t("Porto Alegre"), t("RS")],
            vec![t("NILFA CID SILVANDRO LTDA"), n(10.0), t("Rio de Janeiro"), t("RJ")],
        ],
    )
}

fn visits() -> Table {
    Table::from_rows(
        &["weekday", "visits", "rank"],
        vec![
            vec![t("sunday"), n(67.0), n(0.0)],
            vec![t("monday"), n(1301.0), n(1.0)],
            vec![t("tuesday"), n(1238.0), n(2.0)],
            vec![t("wednesday"), n(1038.0), n(3.0)],
            vec![t("thursday"), n(1076.0), n(4.0)],
            vec![t("friday"), n(956.0), n(5.0)],
            vec![t("saturday"), n(677.0), n(6.0)],
        ],
    )
}

fn gender() -> Table {
    Table::from_rows(
        &["gender", "leads"],
        vec![
            vec![t("women"), n(15106.0)],
            vec![t("men"), n(10003.0)],
        ],
    )
}

fn job_status() -> Table {
    Table::from_rows(
        &["status", "leads_percent"],
        vec![
            vec![t("student"), n(0.0)],
            vec![t("civil servant"), n(2.0)],
            vec![t("retired"), n(4.0)],
            vec![t("freelancer"), n(5.0)],
            vec![t("self-employed"), n(7.0)],
            vec![t("business owner"), n(8.0)],
            vec![t("other"), n(9.0)],
            vec![t("salaried"), n(65.0)],
        ],
    )
}

fn age_band() -> Table {
    Table::from_rows(
        &["band", "leads_percent"],
        vec![
            vec![t("80+"), n(0.0)],
            vec![t("60-80"), n(19.0)],
            vec![t("40-60"), n(30.0)],
            vec![t("20-40"), n(49.0)],
            vec![t("0-20"), n(2.0)],
        ],
    )
}

fn income_band() -> Table {
    Table::from_rows(
        &["band", "leads_percent", "rank"],
        vec![
            vec![t("20000+"), n(2.0), n(5.0)],
            vec![t("15000-20000"), n(2.0), n(4.0)],
            vec![t("10000-15000"), n(10.0), n(3.0)],
            vec![t("5000-10000"), n(71.0), n(2.0)],
            vec![t("0-5000"), n(16.0), n(1.0)],
        ],
    )
}

fn vehicle_condition() -> Table {
    Table::from_rows(
        &["condition", "visits"],
        vec![
            vec![t("new"), n(1162.0)],
            vec![t("used"), n(29418.0)],
        ],
    )
}

fn vehicle_age() -> Table {
    Table::from_rows(
        &["band", "visits_percent", "rank"],
        vec![
            vec![t("up to 2 years"), n(4.0), n(1.0)],
            vec![t("2 to 4 years"), n(11.0), n(2.0)],
            vec![t("4 to 6 years"), n(18.0), n(3.0)],
            vec![t("6 to 8 years"), n(20.0), n(4.0)],
            vec![t("8 to 10 years"), n(25.0), n(5.0)],
            vec![t("over 10 years"), n(23.0), n(6.0)],
        ],
    )
}

fn vehicles_visited() -> Table {
    Table::from_rows(
        &["brand", "model", "visits"],
        vec![
            vec![t("AUDI"), t("A1"), n(18.0)],
            vec![t("AUDI"), t("A3"), n(32.0)],
            vec![t("AUDI"), t("A4"), n(19.0)],
            vec![t("AUDI"), t("A5"), n(7.0)],
            vec![t("AUDI"), t("A6"), n(1.0)],
            vec![t("AUDI"), t("A7"), n(1.0)],
            vec![t("AUDI"), t("Q3"), n(30.0)],
            vec![t("AUDI"), t("Q5"), n(6.0)],
            vec![t("AUDI"), t("Q7"), n(4.0)],
            vec![t("AUDI"), t("R8"), n(1.0)],
            vec![t("AUDI"), t("RS4"), n(1.0)],
            vec![t("AUDI"), t("TT"), n(4.0)],
            vec![t("AUDI"), t("TTS"), n(1.0)],
            vec![t("BMW"), t("Série 1"), n(65.0)],
            vec![t("BMW"), t("X1"), n(57.0)],
            vec![t("CHEVROLET"), t("ONIX"), n(1012.0)],
            vec![t("CHEVROLET"), t("CELTA"), n(1028.0)],
            vec![t("CHEVROLET"), t("PRISMA"), n(680.0)],
            vec![t("FIAT"), t("PALIO"), n(1699.0)],
            vec![t("FIAT"), t("UNO"), n(1385.0)],
            vec![t("FORD"), t("FIESTA"), n(1221.0)],
            vec![t("FORD"), t("KA"), n(968.0)],
            vec![t("HYUNDAI"), t("HB20"), n(768.0)],
            vec![t("RENAULT"), t("SANDERO"), n(1039.0)],
            vec![t("VOLKSWAGEN"), t("GOL"), n(1547.0)],
            vec![t("VOLKSWAGEN"), t("FOX"), n(983.0)],
        ],
    )
}

/// Default table for one `data_key`, if it is part of the catalog.
pub fn default_table(data_key: &str) -> Option<Table> {
    let table = match data_key {
        "monthly" => monthly(),
        "states" => states(),
        "brands" => brands(),
        "stores" => stores(),
        "visits" => visits(),
        "gender" => gender(),
        "job_status" => job_status(),
        "age_band" => age_band(),
        "income_band" => income_band(),
        "vehicle_condition" => vehicle_condition(),
        "vehicle_age" => vehicle_age(),
        "vehicles_visited" => vehicles_visited(),
        _ => return None,
    };
    Some(table)
}

/// A complete, freshly seeded dashboard.
pub fn seed_dashboard() -> Dashboard {
    let mut dashboard = Dashboard::new();
    for category in [Category::Sales, Category::Leads] {
        for config in table_configs(category) {
            if let Some(table) = default_table(config.data_key) {
                dashboard.insert(config.data_key.to_string(), table);
            }
        }
    }
    dashboard
}
