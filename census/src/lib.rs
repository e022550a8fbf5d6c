pub use census_schema::*;
pub use {
    census_aggregate as aggregate, census_error as error, census_ingest as ingest,
    census_store as store, census_zones as zones,
};
