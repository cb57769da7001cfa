use chrono::NaiveDate;
use lotledger::db::init_db;
use lotledger::{
    read_export, Amount, Currency, ImportError, ImportSource, LedgerProcessor, Repository,
    TransactionKind,
};
use std::io::Write;
use tempfile::TempDir;

const ETRADE_HEADER: &str =
    "TransactionDate,TransactionType,SecurityType,Symbol,Quantity,Amount,Price,Commission,Description";

const NORDNET_HEADER: &str = "Id\tBokföringsdag\tAffärsdag\tLikviddag\tDepå\tTransaktionstyp\tVärdepapper\tISIN\tAntal\tKurs\tRänta\tTotal Avgift\tValuta\tBelopp\tValuta\tInköpsvärde\tValuta\tResultat\tValuta\tTotalt antal\tSaldo\tVäxlingskurs\tTransaktionstext\tMakuleringsdatum\tNotanummer\tVerifikationsnummer\tCourtage\tValuta\tReferensvalutakurs\tInitial låneränta";

async fn setup_repo(temp_dir: &TempDir) -> Repository {
    let db_path = temp_dir
        .path()
        .join("ledger.db")
        .to_string_lossy()
        .to_string();
    let pool = init_db(&db_path).await.expect("init_db failed");
    Repository::new(pool)
}

fn d(s: &str) -> Amount {
    s.parse().unwrap()
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn nordnet_line(
    id: &str,
    settlement_day: &str,
    kind: &str,
    quantity: &str,
    price: &str,
    fee: &str,
    purchase_value: &str,
) -> String {
    let mut columns = vec![""; 30];
    columns[0] = id;
    columns[3] = settlement_day;
    columns[5] = kind;
    columns[6] = "Investor B";
    columns[7] = "SE0015811963";
    columns[8] = quantity;
    columns[9] = price;
    columns[11] = fee;
    columns[15] = purchase_value;
    columns.join("\t")
}

fn write_utf16le(path: &std::path::Path, text: &str) {
    let mut bytes = vec![0xFF, 0xFE];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    std::fs::write(path, bytes).unwrap();
}

#[tokio::test]
async fn test_etrade_export_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let repo = setup_repo(&temp_dir).await;
    let path = temp_dir.path().join("etrade.csv");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "{ETRADE_HEADER}").unwrap();
    // Listed out of order; the sale must still see both purchases.
    writeln!(file, "03/10/21,Sold,EQ,AAPL,-12,1439.00,120.00,1.00,SOLD").unwrap();
    writeln!(file, "03/01/21,Bought,EQ,AAPL,10,-1000.00,100.00,,BOUGHT").unwrap();
    writeln!(file, "03/10/21,Bought,EQ,AAPL,5,-550.00,110.00,0,BOUGHT").unwrap();
    writeln!(file, "03/15/21,Qualified Dividend,EQ,AAPL,,2.05,,,DIVIDEND").unwrap();
    writeln!(file, "03/16/21,Margin Interest,,,,-0.50,,,INTEREST").unwrap();
    drop(file);

    let records = read_export(&path, ImportSource::ETrade, false).unwrap();
    assert_eq!(records.len(), 4);

    let summary = LedgerProcessor::process_transactions(&repo, &records)
        .await
        .unwrap();
    assert_eq!(summary.records, 4);
    assert_eq!(summary.lots_created, 2);

    let lots = repo.query_lots("AAPL", false).await.unwrap();
    assert_eq!(lots.len(), 2);
    // The 110 lot is drawn first and closed; the 100 lot keeps 3 shares.
    assert_eq!(lots[0].cost_basis_per_share, d("110"));
    assert!(lots[0].is_closed());
    assert_eq!(lots[1].shares, d("3"));
    assert_eq!(lots[1].cost_basis_currency, Currency::Usd);

    let txs = repo
        .query_transactions_between(date("2021-03-01"), date("2021-03-31"))
        .await
        .unwrap();
    let sales: Vec<_> = txs
        .iter()
        .filter(|tx| tx.kind == TransactionKind::Sale)
        .collect();
    assert_eq!(sales.len(), 2);
    let net: Amount = sales.iter().map(|tx| tx.total_amount).sum();
    assert_eq!(net, d("1439"));

    let dividend = txs
        .iter()
        .find(|tx| tx.kind == TransactionKind::QualifiedDividend)
        .unwrap();
    assert_eq!(dividend.total_amount, d("2.05"));
    assert_eq!(dividend.lot_id, None);
}

#[tokio::test]
async fn test_nordnet_utf16_export_end_to_end() {
    let temp_dir = TempDir::new().unwrap();
    let repo = setup_repo(&temp_dir).await;
    let path = temp_dir.path().join("nordnet.csv");

    let lines = [
        NORDNET_HEADER.to_string(),
        nordnet_line("101", "2022-01-05", "KÖPT", "10", "250,50", "39", ""),
        nordnet_line("102", "2022-05-20", "SPLIT UTTAG VP", "-10", "", "", ""),
        nordnet_line("103", "2022-05-20", "SPLIT INLÄGG VP", "40", "", "", "2 505,00"),
        nordnet_line("104", "2022-06-01", "INSÄTTNING", "", "", "", ""),
        nordnet_line("105", "2022-07-01", "SÅLT", "-15", "70,00", "19", ""),
    ];
    write_utf16le(&path, &(lines.join("\n") + "\n"));

    let records = read_export(&path, ImportSource::Nordnet, false).unwrap();
    let kinds: Vec<_> = records.iter().map(|r| r.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            TransactionKind::Purchase,
            TransactionKind::SplitIn,
            TransactionKind::SplitOut,
            TransactionKind::Sale,
        ]
    );
    assert_eq!(records[0].security_key(), "SE0015811963");

    LedgerProcessor::process_transactions(&repo, &records)
        .await
        .unwrap();

    let open = repo.query_lots("SE0015811963", true).await.unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].shares, d("25"));
    assert_eq!(open[0].cost_basis_per_share, d("62.625"));
    assert_eq!(open[0].cost_basis_currency, Currency::Sek);

    let sale = repo
        .query_transactions_between(date("2022-07-01"), date("2022-07-01"))
        .await
        .unwrap();
    assert_eq!(sale.len(), 1);
    assert_eq!(sale[0].reference.as_deref(), Some("105"));
    assert_eq!(sale[0].share_value, d("1050"));
    assert_eq!(sale[0].total_amount, d("1031"));
}

#[test]
fn test_malformed_export_aborts_unless_skipping() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("etrade.csv");
    std::fs::write(
        &path,
        format!(
            "{ETRADE_HEADER}\n03/01/21,Bought,EQ,AAPL,ten,-1000.00,100.00,,BOUGHT\n\
             2021-03-02,Bought,EQ,AAPL,1,-100.00,100.00,,BOUGHT\n\
             03/03/21,Bought,EQ,AAPL,1,-100.00,100.00,,BOUGHT\n"
        ),
    )
    .unwrap();

    match read_export(&path, ImportSource::ETrade, false) {
        Err(ImportError::Value { field, value, .. }) => {
            assert_eq!(field, "Quantity");
            assert_eq!(value, "ten");
        }
        other => panic!("expected value error, got {other:?}"),
    }

    let records = read_export(&path, ImportSource::ETrade, true).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].transaction.settlement_date, date("2021-03-03"));
}

#[test]
fn test_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let result = read_export(temp_dir.path().join("absent.csv"), ImportSource::Nordnet, false);
    assert!(matches!(result, Err(ImportError::Io(_))));
}
