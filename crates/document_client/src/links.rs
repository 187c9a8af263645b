//! Id-based resource links, mirroring the service's addressing scheme.
//! Every function returns a link usable both as a request path and as the
//! resource link signed into the authorization header.

pub fn database(database_id: &str) -> String {
    format!("dbs/{database_id}")
}

pub fn collection(database_id: &str, collection_id: &str) -> String {
    format!("dbs/{database_id}/colls/{collection_id}")
}

pub fn document(database_id: &str, collection_id: &str, document_id: &str) -> String {
    format!("dbs/{database_id}/colls/{collection_id}/docs/{document_id}")
}

pub fn stored_procedure(database_id: &str, collection_id: &str, sproc_id: &str) -> String {
    format!("dbs/{database_id}/colls/{collection_id}/sprocs/{sproc_id}")
}

pub fn trigger(database_id: &str, collection_id: &str, trigger_id: &str) -> String {
    format!("dbs/{database_id}/colls/{collection_id}/triggers/{trigger_id}")
}

pub fn user_defined_function(database_id: &str, collection_id: &str, udf_id: &str) -> String {
    format!("dbs/{database_id}/colls/{collection_id}/udfs/{udf_id}")
}

pub fn user(database_id: &str, user_id: &str) -> String {
    format!("dbs/{database_id}/users/{user_id}")
}

pub fn permission(database_id: &str, user_id: &str, permission_id: &str) -> String {
    format!("dbs/{database_id}/users/{user_id}/permissions/{permission_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_follow_the_addressing_scheme() {
        assert_eq!(database("mydb"), "dbs/mydb");
        assert_eq!(collection("mydb", "mystore"), "dbs/mydb/colls/mystore");
        assert_eq!(
            stored_procedure("mydb", "mystore", "spHelloWorld"),
            "dbs/mydb/colls/mystore/sprocs/spHelloWorld"
        );
        assert_eq!(
            permission("mydb", "Alice", "AliceCollectionAccess"),
            "dbs/mydb/users/Alice/permissions/AliceCollectionAccess"
        );
    }
}
