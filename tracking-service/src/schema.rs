diesel::table! {
    orders (id) {
        id -> Uuid,
        merchant_order_id -> Varchar,
        order_key -> Varchar,
        status -> Varchar,
        language -> Varchar,
        total_gross_amount -> Numeric,
        currency -> Varchar,
        country -> Nullable<Varchar>,
        created_at -> Nullable<Timestamptz>,
        updated_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    payments (payment_id) {
        payment_id -> Varchar,
        order_id -> Uuid,
        kind -> Varchar,
        status -> Varchar,
        payment_method -> Varchar,
        holder_name -> Nullable<Varchar>,
        holder_city -> Nullable<Varchar>,
        holder_country_code -> Nullable<Varchar>,
        iban -> Nullable<Varchar>,
        bic -> Nullable<Varchar>,
        created_at -> Nullable<Timestamptz>,
        updated_at -> Nullable<Timestamptz>,
    }
}

diesel::joinable!(payments -> orders (order_id));

diesel::allow_tables_to_appear_in_same_query!(orders, payments);
