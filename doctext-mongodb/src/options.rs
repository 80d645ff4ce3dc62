//! Translation of facade options into MongoDB driver options.
//!
//! The driver's option structs are non-exhaustive, so each translation starts
//! from the driver default and assigns the fields the facade knows about.

use mongodb::{
    options::{
        self as driver, Acknowledgment, Hint, ReadConcern, ReadPreference, SelectionCriteria,
        WriteConcern,
    },
};

use doctext_core::options::{
    CollectionOptions, CountOptions, DatabaseOptions, DeleteOptions, DistinctOptions,
    EstimatedCountOptions, FindOneAndDeleteOptions, FindOneAndModifyOptions, FindOneOptions,
    FindOptions, InsertManyOptions, InsertOneOptions, ListCollectionsOptions, ReadConcernLevel,
    ReadPreferenceMode, ReturnDocument, RunCommandOptions, UpdateOptions, WriteAcknowledgment,
};

pub(crate) fn read_concern(level: ReadConcernLevel) -> ReadConcern {
    match level {
        ReadConcernLevel::Local => ReadConcern::local(),
        ReadConcernLevel::Majority => ReadConcern::majority(),
        ReadConcernLevel::Linearizable => ReadConcern::linearizable(),
        ReadConcernLevel::Available => ReadConcern::available(),
        ReadConcernLevel::Snapshot => ReadConcern::snapshot(),
    }
}

pub(crate) fn write_concern(acknowledgment: &WriteAcknowledgment) -> WriteConcern {
    let mut concern = WriteConcern::default();
    concern.w = Some(match acknowledgment {
        WriteAcknowledgment::Nodes(nodes) => Acknowledgment::Nodes(*nodes),
        WriteAcknowledgment::Majority => Acknowledgment::Majority,
        WriteAcknowledgment::Custom(name) => Acknowledgment::Custom(name.clone()),
    });
    concern
}

pub(crate) fn selection_criteria(mode: ReadPreferenceMode) -> SelectionCriteria {
    SelectionCriteria::ReadPreference(match mode {
        ReadPreferenceMode::Primary => ReadPreference::Primary,
        ReadPreferenceMode::PrimaryPreferred => ReadPreference::PrimaryPreferred { options: Default::default() },
        ReadPreferenceMode::Secondary => ReadPreference::Secondary { options: Default::default() },
        ReadPreferenceMode::SecondaryPreferred => ReadPreference::SecondaryPreferred { options: Default::default() },
        ReadPreferenceMode::Nearest => ReadPreference::Nearest { options: Default::default() },
    })
}

pub(crate) fn database(options: &DatabaseOptions) -> driver::DatabaseOptions {
    let mut translated = driver::DatabaseOptions::default();
    translated.read_concern = options.read_concern.map(read_concern);
    translated.write_concern = options.write_concern.as_ref().map(write_concern);
    translated
}

pub(crate) fn collection(options: &CollectionOptions) -> driver::CollectionOptions {
    let mut translated = driver::CollectionOptions::default();
    translated.read_concern = options.read_concern.map(read_concern);
    translated.write_concern = options.write_concern.as_ref().map(write_concern);
    translated
}

pub(crate) fn run_command(options: RunCommandOptions) -> Option<SelectionCriteria> {
    options.read_preference.map(selection_criteria)
}

pub(crate) fn list_collections(options: ListCollectionsOptions) -> driver::ListCollectionsOptions {
    let mut translated = driver::ListCollectionsOptions::default();
    translated.batch_size = options.batch_size;
    translated.authorized_collections = options.authorized_collections;
    translated
}

pub(crate) fn count(options: CountOptions) -> driver::CountOptions {
    let mut translated = driver::CountOptions::default();
    translated.limit = options.limit;
    translated.skip = options.skip;
    translated.max_time = options.max_time;
    translated
}

pub(crate) fn estimated_count(options: EstimatedCountOptions) -> driver::EstimatedDocumentCountOptions {
    let mut translated = driver::EstimatedDocumentCountOptions::default();
    translated.max_time = options.max_time;
    translated
}

pub(crate) fn find(options: FindOptions) -> driver::FindOptions {
    let mut translated = driver::FindOptions::default();
    translated.limit = options.limit;
    translated.skip = options.skip;
    translated.sort = options.sort;
    translated.projection = options.projection;
    translated.batch_size = options.batch_size;
    translated.max_time = options.max_time;
    translated
}

pub(crate) fn find_one(options: FindOneOptions) -> driver::FindOneOptions {
    let mut translated = driver::FindOneOptions::default();
    translated.skip = options.skip;
    translated.sort = options.sort;
    translated.projection = options.projection;
    translated.max_time = options.max_time;
    translated
}

pub(crate) fn find_one_and_delete(options: FindOneAndDeleteOptions) -> driver::FindOneAndDeleteOptions {
    let mut translated = driver::FindOneAndDeleteOptions::default();
    translated.sort = options.sort;
    translated.projection = options.projection;
    translated.max_time = options.max_time;
    translated
}

fn return_document(value: ReturnDocument) -> driver::ReturnDocument {
    match value {
        ReturnDocument::Before => driver::ReturnDocument::Before,
        ReturnDocument::After => driver::ReturnDocument::After,
    }
}

pub(crate) fn find_one_and_replace(options: FindOneAndModifyOptions) -> driver::FindOneAndReplaceOptions {
    let mut translated = driver::FindOneAndReplaceOptions::default();
    translated.return_document = Some(return_document(options.return_document));
    translated.upsert = options.upsert;
    translated.sort = options.sort;
    translated.projection = options.projection;
    translated.max_time = options.max_time;
    translated
}

pub(crate) fn find_one_and_update(options: FindOneAndModifyOptions) -> driver::FindOneAndUpdateOptions {
    let mut translated = driver::FindOneAndUpdateOptions::default();
    translated.return_document = Some(return_document(options.return_document));
    translated.upsert = options.upsert;
    translated.sort = options.sort;
    translated.projection = options.projection;
    translated.max_time = options.max_time;
    translated
}

pub(crate) fn insert_one(options: InsertOneOptions) -> driver::InsertOneOptions {
    let mut translated = driver::InsertOneOptions::default();
    translated.bypass_document_validation = options.bypass_document_validation;
    translated
}

pub(crate) fn insert_many(options: InsertManyOptions) -> driver::InsertManyOptions {
    let mut translated = driver::InsertManyOptions::default();
    translated.ordered = options.ordered;
    translated.bypass_document_validation = options.bypass_document_validation;
    translated
}

pub(crate) fn update(options: UpdateOptions) -> driver::UpdateOptions {
    let mut translated = driver::UpdateOptions::default();
    translated.upsert = options.upsert;
    translated.bypass_document_validation = options.bypass_document_validation;
    translated
}

pub(crate) fn replace(options: UpdateOptions) -> driver::ReplaceOptions {
    let mut translated = driver::ReplaceOptions::default();
    translated.upsert = options.upsert;
    translated.bypass_document_validation = options.bypass_document_validation;
    translated
}

pub(crate) fn delete(options: DeleteOptions) -> driver::DeleteOptions {
    let mut translated = driver::DeleteOptions::default();
    translated.hint = options.hint.map(Hint::Name);
    translated
}

pub(crate) fn distinct(options: DistinctOptions) -> driver::DistinctOptions {
    let mut translated = driver::DistinctOptions::default();
    translated.max_time = options.max_time;
    translated
}
